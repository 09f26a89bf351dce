//! Books resource: `/api/books`.

pub mod dto;
pub mod mapper;
pub mod models;
pub mod repository;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookstore_http::resource::openapi_fragment;
use bookstore_http::{Resource, ResourceController};
use bookstore_kernel::{InitCtx, Migration, Module, Repository, RepositoryError};
use bookstore_telemetry::Logger;
use serde_json::json;
use sqlx::SqlitePool;

use crate::modules::authors::models::Author;
use crate::modules::authors::repository::AuthorRepository;
use dto::{BookCreateDto, BookDto, BookUpdateDto};
use models::Book;
use repository::BookRepository;

/// Books may only reference authors that exist.
pub struct BookResource {
    authors: Arc<dyn Repository<Author>>,
}

impl BookResource {
    pub fn new(authors: Arc<dyn Repository<Author>>) -> Self {
        Self { authors }
    }
}

#[async_trait]
impl Resource for BookResource {
    type Entity = Book;
    type CreateDto = BookCreateDto;
    type UpdateDto = BookUpdateDto;
    type ReadDto = BookDto;

    const NAME: &'static str = "books";
    const SINGULAR: &'static str = "book";

    fn entity_id(entity: &Book) -> i64 {
        entity.id
    }

    fn update_id(dto: &BookUpdateDto) -> i64 {
        dto.id
    }

    fn from_create(dto: BookCreateDto) -> Book {
        mapper::from_create(dto)
    }

    fn from_update(dto: BookUpdateDto) -> Book {
        mapper::from_update(dto)
    }

    fn to_read(entity: &Book) -> BookDto {
        mapper::to_dto(entity)
    }

    async fn check_references(
        &self,
        entity: &Book,
    ) -> Result<Vec<serde_json::Value>, RepositoryError> {
        let Some(author_id) = entity.author_id else {
            return Ok(Vec::new());
        };
        if self.authors.exists(author_id).await? {
            return Ok(Vec::new());
        }
        Ok(vec![json!({
            "field": "authorId",
            "error": format!("author {author_id} does not exist"),
        })])
    }
}

pub type BooksController = ResourceController<BookResource>;

pub struct BooksModule {
    controller: BooksController,
}

impl BooksModule {
    pub fn new(
        repository: Arc<dyn Repository<Book>>,
        authors: Arc<dyn Repository<Author>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            controller: ResourceController::new(BookResource::new(authors), repository, logger),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        BookResource::NAME
    }

    fn routes(&self) -> Option<Router> {
        Some(self.controller.clone().routes())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment::<BookResource>("Books", Vec::new()))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Applied after the authors migrations; `author_id` is cleared when its
/// author is deleted.
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS books (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                title     TEXT NOT NULL,
                year      INTEGER NOT NULL,
                isbn      TEXT NOT NULL,
                summary   TEXT,
                image     TEXT,
                author_id INTEGER REFERENCES authors(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS books_author_id ON books (author_id);
            "#,
    }]
}

/// Create the books module backed by `pool`
pub fn create_module(pool: SqlitePool, logger: Arc<dyn Logger>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(
        Arc::new(BookRepository::new(pool.clone())),
        Arc::new(AuthorRepository::new(pool)),
        logger,
    ))
}
