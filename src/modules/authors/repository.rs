//! SQLite-backed author storage.

use std::collections::HashMap;

use async_trait::async_trait;
use bookstore_kernel::{Repository, RepositoryError};
use sqlx::SqlitePool;

use super::models::Author;
use crate::modules::books::models::Book;

const SELECT_AUTHORS: &str = "SELECT id, first_name, last_name FROM authors";
const SELECT_BOOKS: &str =
    "SELECT id, title, year, isbn, summary, image, author_id FROM books";

/// Authors are always returned with their books attached.
pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn books_of(&self, author_id: i64) -> Result<Vec<Book>, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!("{SELECT_BOOKS} WHERE author_id = ? ORDER BY id"))
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::storage)
    }
}

#[async_trait]
impl Repository<Author> for AuthorRepository {
    async fn find_all(&self) -> Result<Vec<Author>, RepositoryError> {
        let mut authors = sqlx::query_as::<_, Author>(&format!("{SELECT_AUTHORS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "{SELECT_BOOKS} WHERE author_id IS NOT NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        let mut by_author: HashMap<i64, Vec<Book>> = HashMap::new();
        for book in books {
            if let Some(author_id) = book.author_id {
                by_author.entry(author_id).or_default().push(book);
            }
        }
        for author in &mut authors {
            author.books = by_author.remove(&author.id).unwrap_or_default();
        }

        Ok(authors)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepositoryError> {
        let author = sqlx::query_as::<_, Author>(&format!("{SELECT_AUTHORS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        let Some(mut author) = author else {
            return Ok(None);
        };
        author.books = self.books_of(author.id).await?;
        Ok(Some(author))
    }

    async fn exists(&self, id: i64) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;
        Ok(count > 0)
    }

    async fn create(&self, entity: &mut Author) -> Result<bool, RepositoryError> {
        let result = sqlx::query("INSERT INTO authors (first_name, last_name) VALUES (?, ?)")
            .bind(&entity.first_name)
            .bind(&entity.last_name)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        entity.id = result.last_insert_rowid();
        Ok(true)
    }

    async fn update(&self, entity: &Author) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE authors SET first_name = ?, last_name = ? WHERE id = ?")
            .bind(&entity.first_name)
            .bind(&entity.last_name)
            .bind(entity.id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, entity: &Author) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(entity.id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        Ok(result.rows_affected() > 0)
    }
}
