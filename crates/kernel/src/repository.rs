//! Storage-agnostic persistence contract shared by every resource.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a storage backend.
///
/// Repositories never translate these into transport semantics; callers decide
/// how a storage failure surfaces.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wrap a backend error
    pub fn storage(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(error.into())
    }
}

/// CRUD operations for one entity type keyed by an integer identifier.
///
/// `find_by_id` returns `None` for a missing row; it is up to the caller to
/// decide whether that is an error. Write operations report whether the
/// backend actually applied the change.
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// All rows in insertion order
    async fn find_all(&self) -> Result<Vec<T>, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<T>, RepositoryError>;

    /// Existence check that does not load the full entity
    async fn exists(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Persist a new row and write the assigned identifier back into `entity`
    async fn create(&self, entity: &mut T) -> Result<bool, RepositoryError>;

    /// Replace every mutable field of the row identified by `entity`
    async fn update(&self, entity: &T) -> Result<bool, RepositoryError>;

    /// Remove the row identified by `entity`
    async fn delete(&self, entity: &T) -> Result<bool, RepositoryError>;
}
