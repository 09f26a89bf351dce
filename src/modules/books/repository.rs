//! SQLite-backed book storage.

use async_trait::async_trait;
use bookstore_kernel::{Repository, RepositoryError};
use sqlx::SqlitePool;

use super::models::Book;

const SELECT_BOOKS: &str =
    "SELECT id, title, year, isbn, summary, image, author_id FROM books";

pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Book> for BookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!("{SELECT_BOOKS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::storage)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!("{SELECT_BOOKS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::storage)
    }

    async fn exists(&self, id: i64) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;
        Ok(count > 0)
    }

    async fn create(&self, entity: &mut Book) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO books (title, year, isbn, summary, image, author_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entity.title)
        .bind(entity.year)
        .bind(&entity.isbn)
        .bind(&entity.summary)
        .bind(&entity.image)
        .bind(entity.author_id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        entity.id = result.last_insert_rowid();
        Ok(true)
    }

    async fn update(&self, entity: &Book) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE books
             SET title = ?, year = ?, isbn = ?, summary = ?, image = ?, author_id = ?
             WHERE id = ?",
        )
        .bind(&entity.title)
        .bind(entity.year)
        .bind(&entity.isbn)
        .bind(&entity.summary)
        .bind(&entity.image)
        .bind(entity.author_id)
        .bind(entity.id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, entity: &Book) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(entity.id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        Ok(result.rows_affected() > 0)
    }
}
