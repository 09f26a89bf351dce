pub mod authors;
pub mod books;
pub mod rules;

use std::sync::Arc;

use bookstore_kernel::ModuleRegistry;
use bookstore_telemetry::Logger;
use sqlx::SqlitePool;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool, logger: Arc<dyn Logger>) {
    registry.register_custom(authors::create_module(pool.clone(), Arc::clone(&logger)));
    registry.register_custom(books::create_module(pool.clone(), logger));
}

/// Fresh in-memory database with every module's schema applied
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = bookstore_db::connect(&bookstore_kernel::settings::DatabaseSettings::in_memory())
        .await
        .unwrap();
    let migrations: Vec<_> = authors::migrations()
        .into_iter()
        .map(|m| ("authors".to_string(), m))
        .chain(books::migrations().into_iter().map(|m| ("books".to_string(), m)))
        .collect();
    bookstore_db::migrate(&pool, &migrations).await.unwrap();
    pool
}
