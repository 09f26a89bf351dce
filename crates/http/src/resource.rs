//! Generic CRUD pipeline shared by every resource controller.
//!
//! A [`Resource`] describes one entity: its DTO shapes, how to map between
//! them and which cross-entity references must hold. [`ResourceController`]
//! sequences validation, existence checks, persistence and mapping the same
//! way for every resource and reports the outcome as a [`ResourceError`]; the
//! axum handlers at the bottom perform the single translation into HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use bookstore_kernel::{Repository, RepositoryError};
use bookstore_telemetry::Logger;
use garde::Validate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::{PartialSchema, ToSchema};

use crate::error::AppError;

const INVALID_ID: &str = "id must be a positive integer";
const MISSING_BODY: &str = "request body is missing or malformed";
const ID_MISMATCH: &str = "id in path does not match id in body";

/// Operation names used as log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Create,
    Update,
}

impl WriteKind {
    const fn operation(self) -> Operation {
        match self {
            WriteKind::Create => Operation::Create,
            WriteKind::Update => Operation::Update,
        }
    }
}

/// Description of one REST resource: entity, DTO shapes and mapping.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Entity: Send + Sync + 'static;
    type CreateDto: DeserializeOwned + Validate<Context = ()> + ToSchema + Send + 'static;
    type UpdateDto: DeserializeOwned + Validate<Context = ()> + ToSchema + Send + 'static;
    type ReadDto: Serialize + ToSchema + Send + 'static;

    /// Plural name; also the mount point under `/api`
    const NAME: &'static str;
    /// Singular name used in client-facing messages
    const SINGULAR: &'static str;

    fn entity_id(entity: &Self::Entity) -> i64;
    fn update_id(dto: &Self::UpdateDto) -> i64;

    fn from_create(dto: Self::CreateDto) -> Self::Entity;
    fn from_update(dto: Self::UpdateDto) -> Self::Entity;
    fn to_read(entity: &Self::Entity) -> Self::ReadDto;

    /// Cross-entity rules checked after schema validation and before any
    /// write. Returns validation issues in the same shape as schema errors.
    async fn check_references(
        &self,
        _entity: &Self::Entity,
    ) -> Result<Vec<serde_json::Value>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Outcome of a failed resource operation, before any transport mapping.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("request validation failed")]
    Validation(Vec<serde_json::Value>),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// Storage failed or refused the write; the cause is only logged.
    #[error("{operation} on {resource} failed")]
    Persistence {
        resource: &'static str,
        operation: &'static str,
    },
}

impl From<ResourceError> for AppError {
    fn from(error: ResourceError) -> Self {
        match error {
            ResourceError::Validation(details) => {
                AppError::validation(details, "request validation failed")
            }
            ResourceError::BadRequest(message) => AppError::bad_request(message),
            not_found @ ResourceError::NotFound { .. } => AppError::not_found(not_found.to_string()),
            failure @ ResourceError::Persistence { .. } => AppError::Internal(failure.into()),
        }
    }
}

/// Schema validation issues as `{ "field", "error" }` objects; empty when valid.
pub fn validation_issues<D>(dto: &D) -> Vec<serde_json::Value>
where
    D: Validate<Context = ()>,
{
    match dto.validate() {
        Ok(()) => Vec::new(),
        Err(report) => report
            .iter()
            .map(|(path, error)| {
                json!({ "field": camel_case(&path.to_string()), "error": error.message() })
            })
            .collect(),
    }
}

/// `author_id` -> `authorId`, matching the JSON field names clients send
fn camel_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut upper = false;
    for c in path.chars() {
        match c {
            '_' => upper = true,
            c if upper => {
                out.extend(c.to_uppercase());
                upper = false;
            }
            c => out.push(c),
        }
    }
    out
}

/// Controller running the CRUD pipeline for `R` against its repository.
pub struct ResourceController<R: Resource> {
    resource: Arc<R>,
    repository: Arc<dyn Repository<R::Entity>>,
    logger: Arc<dyn Logger>,
}

impl<R: Resource> Clone for ResourceController<R> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
            repository: Arc::clone(&self.repository),
            logger: Arc::clone(&self.logger),
        }
    }
}

impl<R: Resource> ResourceController<R> {
    pub fn new(
        resource: R,
        repository: Arc<dyn Repository<R::Entity>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            resource: Arc::new(resource),
            repository,
            logger,
        }
    }

    /// Every record, mapped to read DTOs. Empty storage is not an error.
    pub async fn list(&self) -> Result<Vec<R::ReadDto>, ResourceError> {
        let op = Operation::List;
        self.logger.debug(R::NAME, op.as_str(), "fetching all records");

        let entities = self.storage(op, self.repository.find_all().await)?;

        self.logger.info(
            R::NAME,
            op.as_str(),
            &format!("returned {} records", entities.len()),
        );
        Ok(entities.iter().map(R::to_read).collect())
    }

    pub async fn get(&self, id: i64) -> Result<R::ReadDto, ResourceError> {
        let op = Operation::Get;
        self.logger
            .debug(R::NAME, op.as_str(), &format!("fetching record {id}"));

        match self.storage(op, self.repository.find_by_id(id).await)? {
            Some(entity) => {
                self.logger
                    .info(R::NAME, op.as_str(), &format!("returned record {id}"));
                Ok(R::to_read(&entity))
            }
            None => Err(self.not_found(op, id)),
        }
    }

    /// Persist a new record; returns the assigned id with the read projection.
    pub async fn create(
        &self,
        dto: Option<R::CreateDto>,
    ) -> Result<(i64, R::ReadDto), ResourceError> {
        let op = Operation::Create;
        self.logger.debug(R::NAME, op.as_str(), "creating record");

        let Some(dto) = dto else {
            return Err(self.bad_request(op, MISSING_BODY));
        };

        let entity = self
            .validate_and_persist(WriteKind::Create, dto, R::from_create)
            .await?;
        let id = R::entity_id(&entity);

        self.logger
            .info(R::NAME, op.as_str(), &format!("created record {id}"));
        Ok((id, R::to_read(&entity)))
    }

    /// Replace the record `id`. Request shape is checked before storage is
    /// touched; existence is checked before the body is validated.
    pub async fn update(&self, id: i64, dto: Option<R::UpdateDto>) -> Result<(), ResourceError> {
        let op = Operation::Update;
        self.logger
            .debug(R::NAME, op.as_str(), &format!("updating record {id}"));

        if id < 1 {
            return Err(self.bad_request(op, INVALID_ID));
        }
        let Some(dto) = dto else {
            return Err(self.bad_request(op, MISSING_BODY));
        };
        if R::update_id(&dto) != id {
            return Err(self.bad_request(op, ID_MISMATCH));
        }

        // Not transactional with the write below: a concurrent delete can
        // still win, in which case the repository reports the write as failed.
        if !self.storage(op, self.repository.exists(id).await)? {
            return Err(self.not_found(op, id));
        }

        self.validate_and_persist(WriteKind::Update, dto, R::from_update)
            .await?;

        self.logger
            .info(R::NAME, op.as_str(), &format!("updated record {id}"));
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ResourceError> {
        let op = Operation::Delete;
        self.logger
            .debug(R::NAME, op.as_str(), &format!("deleting record {id}"));

        if id < 1 {
            return Err(self.bad_request(op, INVALID_ID));
        }
        if !self.storage(op, self.repository.exists(id).await)? {
            return Err(self.not_found(op, id));
        }

        let Some(entity) = self.storage(op, self.repository.find_by_id(id).await)? else {
            // Removed between the existence check and the fetch.
            return Err(self.not_found(op, id));
        };

        if !self.storage(op, self.repository.delete(&entity).await)? {
            self.logger.error(
                R::NAME,
                op.as_str(),
                &format!("delete of record {id} was not applied"),
            );
            return Err(self.persistence_failure(op));
        }

        self.logger
            .info(R::NAME, op.as_str(), &format!("deleted record {id}"));
        Ok(())
    }

    /// Shared create/update tail: schema validation, mapping, reference
    /// checks, then the write matching `kind`.
    async fn validate_and_persist<D>(
        &self,
        kind: WriteKind,
        dto: D,
        map: fn(D) -> R::Entity,
    ) -> Result<R::Entity, ResourceError>
    where
        D: Validate<Context = ()> + Send,
    {
        let op = kind.operation();

        let issues = validation_issues(&dto);
        if !issues.is_empty() {
            return Err(self.invalid(op, issues));
        }

        let mut entity = map(dto);

        let issues = self.storage(op, self.resource.check_references(&entity).await)?;
        if !issues.is_empty() {
            return Err(self.invalid(op, issues));
        }

        let written = match kind {
            WriteKind::Create => self.repository.create(&mut entity).await,
            WriteKind::Update => self.repository.update(&entity).await,
        };

        if !self.storage(op, written)? {
            self.logger
                .error(R::NAME, op.as_str(), "repository did not apply the write");
            return Err(self.persistence_failure(op));
        }

        Ok(entity)
    }

    /// Log a storage error with its detail and replace it by an opaque failure.
    fn storage<T>(
        &self,
        op: Operation,
        result: Result<T, RepositoryError>,
    ) -> Result<T, ResourceError> {
        result.map_err(|error| {
            self.logger.error(R::NAME, op.as_str(), &error.to_string());
            self.persistence_failure(op)
        })
    }

    fn persistence_failure(&self, op: Operation) -> ResourceError {
        ResourceError::Persistence {
            resource: R::NAME,
            operation: op.as_str(),
        }
    }

    fn not_found(&self, op: Operation, id: i64) -> ResourceError {
        self.logger
            .warn(R::NAME, op.as_str(), &format!("record {id} not found"));
        ResourceError::NotFound {
            resource: R::SINGULAR,
            id,
        }
    }

    fn bad_request(&self, op: Operation, reason: &'static str) -> ResourceError {
        self.logger.warn(R::NAME, op.as_str(), reason);
        ResourceError::BadRequest(reason)
    }

    fn invalid(&self, op: Operation, issues: Vec<serde_json::Value>) -> ResourceError {
        self.logger.warn(
            R::NAME,
            op.as_str(),
            &format!("validation failed with {} issue(s)", issues.len()),
        );
        ResourceError::Validation(issues)
    }

    /// Unwrap a JSON body, treating any rejection as an absent DTO.
    fn accept_body<T>(&self, op: Operation, payload: Result<Json<T>, JsonRejection>) -> Option<T> {
        match payload {
            Ok(Json(dto)) => Some(dto),
            Err(rejection) => {
                self.logger.debug(
                    R::NAME,
                    op.as_str(),
                    &format!("rejected request body: {}", rejection.body_text()),
                );
                None
            }
        }
    }

    /// Axum router serving the five operations, to be nested under `/api/{NAME}`
    pub fn routes(self) -> Router {
        Router::new()
            .route("/", get(list_handler::<R>).post(create_handler::<R>))
            .route(
                "/{id}",
                get(get_handler::<R>)
                    .put(update_handler::<R>)
                    .delete(delete_handler::<R>),
            )
            .with_state(self)
    }
}

async fn list_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
) -> Result<Json<Vec<R::ReadDto>>, AppError> {
    Ok(Json(controller.list().await?))
}

async fn get_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<R::ReadDto>, AppError> {
    // Integer route constraint: anything else matches no record.
    let Ok(Path(id)) = id else {
        return Err(AppError::not_found(format!("{} not found", R::SINGULAR)));
    };
    Ok(Json(controller.get(id).await?))
}

async fn create_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    payload: Result<Json<R::CreateDto>, JsonRejection>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<R::ReadDto>), AppError> {
    let dto = controller.accept_body(Operation::Create, payload);
    let (id, created) = controller.create(dto).await?;
    let location = format!("/api/{}/{}", R::NAME, id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

async fn update_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<R::UpdateDto>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Ok(Path(id)) = id else {
        return Err(AppError::bad_request(INVALID_ID));
    };
    let dto = controller.accept_body(Operation::Update, payload);
    controller.update(id, dto).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Ok(Path(id)) = id else {
        return Err(AppError::bad_request(INVALID_ID));
    };
    controller.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Component schema entry `(name, schema)` for a DTO type
pub fn schema_entry<T: ToSchema>() -> (String, serde_json::Value) {
    let schema = serde_json::to_value(<T as PartialSchema>::schema()).unwrap_or_default();
    (T::name().into_owned(), schema)
}

/// OpenAPI fragment for the CRUD surface of `R`, with paths relative to its
/// mount point. `extra_schemas` carries nested DTOs referenced by the main ones.
pub fn openapi_fragment<R: Resource>(
    tag: &str,
    extra_schemas: Vec<(String, serde_json::Value)>,
) -> serde_json::Value {
    let read = <R::ReadDto as ToSchema>::name();
    let create = <R::CreateDto as ToSchema>::name();
    let update = <R::UpdateDto as ToSchema>::name();
    let singular = R::SINGULAR;

    let error = |description: &str| {
        json!({
            "description": description,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        })
    };
    let body = |schema: &str| {
        json!({
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            }
        })
    };
    let id_param = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    }]);

    let mut schemas = serde_json::Map::new();
    for (name, schema) in [
        schema_entry::<R::ReadDto>(),
        schema_entry::<R::CreateDto>(),
        schema_entry::<R::UpdateDto>(),
    ]
    .into_iter()
    .chain(extra_schemas)
    {
        schemas.insert(name, schema);
    }

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": format!("Get all {}", R::NAME),
                    "tags": [tag],
                    "responses": {
                        "200": {
                            "description": format!("List of {}", R::NAME),
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": format!("#/components/schemas/{read}") }
                                    }
                                }
                            }
                        },
                        "500": error("Internal server error")
                    }
                },
                "post": {
                    "summary": format!("Create a {singular}"),
                    "tags": [tag],
                    "requestBody": body(&*create),
                    "responses": {
                        "201": {
                            "description": format!("Created {singular}"),
                            "content": body(&*read)["content"].clone()
                        },
                        "400": error("Invalid request body"),
                        "500": error("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": format!("Get a {singular} by id"),
                    "tags": [tag],
                    "parameters": id_param.clone(),
                    "responses": {
                        "200": {
                            "description": format!("A {singular} record"),
                            "content": body(&*read)["content"].clone()
                        },
                        "404": error("Not found"),
                        "500": error("Internal server error")
                    }
                },
                "put": {
                    "summary": format!("Update a {singular}"),
                    "tags": [tag],
                    "parameters": id_param.clone(),
                    "requestBody": body(&*update),
                    "responses": {
                        "204": { "description": "Updated" },
                        "400": error("Invalid id or request body"),
                        "404": error("Not found"),
                        "500": error("Internal server error")
                    }
                },
                "delete": {
                    "summary": format!("Delete a {singular}"),
                    "tags": [tag],
                    "parameters": id_param,
                    "responses": {
                        "204": { "description": "Deleted" },
                        "400": error("Invalid id"),
                        "404": error("Not found"),
                        "500": error("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": schemas
        }
    })
}
