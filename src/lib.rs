//! Book store application: wires the authors and books modules onto the
//! shared kernel, storage and HTTP crates.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use bookstore_telemetry::{Logger, TracingLogger};

/// A fully initialised application: storage connected, schema migrated and
/// every module started.
pub struct App {
    registry: ModuleRegistry,
    settings: Settings,
}

impl App {
    /// Connect storage, register modules and run the startup lifecycle
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        Self::bootstrap_with_logger(settings, Arc::new(TracingLogger::new())).await
    }

    /// As [`App::bootstrap`], with an explicit logger for resource controllers
    pub async fn bootstrap_with_logger(
        settings: Settings,
        logger: Arc<dyn Logger>,
    ) -> anyhow::Result<Self> {
        let pool = bookstore_db::connect(&settings.database).await?;

        let mut registry = ModuleRegistry::new();
        registry.register_core(bookstore_db::create_module(pool.clone()));
        modules::register_all(&mut registry, &pool, logger);
        tracing::info!(
            core = registry.core_module_count(),
            custom = registry.custom_module_count(),
            "modules registered"
        );

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.init_core_modules(&ctx).await?;
        registry.init_custom_modules(&ctx).await?;

        let applied = bookstore_db::migrate(&pool, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations complete");

        registry.start_core_modules(&ctx).await?;
        registry.start_custom_modules(&ctx).await?;

        Ok(Self { registry, settings })
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The full HTTP surface: module routes, docs and middleware
    pub fn router(&self) -> Router {
        bookstore_http::build_router(&self.registry, &self.settings)
    }

    /// Stop custom modules before the core modules they depend on
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.registry.stop_custom_modules().await?;
        self.registry.stop_core_modules().await?;
        Ok(())
    }
}

/// Bootstrap and serve until Ctrl-C, then shut down cleanly
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let app = App::bootstrap(settings).await?;
    let served = bookstore_http::start_server(&app.registry, &app.settings).await;
    app.shutdown().await?;
    served
}

/// Apply pending migrations and exit; returns how many were applied
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = bookstore_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool, Arc::new(TracingLogger::new()));

    let applied = bookstore_db::migrate(&pool, &registry.collect_migrations()).await;
    pool.close().await;
    applied
}
