//! Authors resource: `/api/authors`.

pub mod dto;
pub mod mapper;
pub mod models;
pub mod repository;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_http::resource::{openapi_fragment, schema_entry};
use bookstore_http::{Resource, ResourceController};
use bookstore_kernel::{InitCtx, Migration, Module, Repository};
use bookstore_telemetry::Logger;
use sqlx::SqlitePool;

use dto::{AuthorBookDto, AuthorCreateDto, AuthorDto, AuthorUpdateDto};
use models::Author;
use repository::AuthorRepository;

pub struct AuthorResource;

#[async_trait]
impl Resource for AuthorResource {
    type Entity = Author;
    type CreateDto = AuthorCreateDto;
    type UpdateDto = AuthorUpdateDto;
    type ReadDto = AuthorDto;

    const NAME: &'static str = "authors";
    const SINGULAR: &'static str = "author";

    fn entity_id(entity: &Author) -> i64 {
        entity.id
    }

    fn update_id(dto: &AuthorUpdateDto) -> i64 {
        dto.id
    }

    fn from_create(dto: AuthorCreateDto) -> Author {
        mapper::from_create(dto)
    }

    fn from_update(dto: AuthorUpdateDto) -> Author {
        mapper::from_update(dto)
    }

    fn to_read(entity: &Author) -> AuthorDto {
        mapper::to_dto(entity)
    }
}

pub type AuthorsController = ResourceController<AuthorResource>;

pub struct AuthorsModule {
    controller: AuthorsController,
}

impl AuthorsModule {
    pub fn new(repository: Arc<dyn Repository<Author>>, logger: Arc<dyn Logger>) -> Self {
        Self {
            controller: ResourceController::new(AuthorResource, repository, logger),
        }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        AuthorResource::NAME
    }

    fn routes(&self) -> Option<Router> {
        Some(self.controller.clone().routes())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment::<AuthorResource>(
            "Authors",
            vec![schema_entry::<AuthorBookDto>()],
        ))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS authors (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name  TEXT NOT NULL
            );
            "#,
    }]
}

/// Create the authors module backed by `pool`
pub fn create_module(pool: SqlitePool, logger: Arc<dyn Logger>) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(
        Arc::new(AuthorRepository::new(pool)),
        logger,
    ))
}
