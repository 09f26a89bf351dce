//! Logging bootstrap for the book store API.
//!
//! `init` installs the process subscriber (console plus optional file sink).
//! Components never log through a global handle of their own; they receive a
//! [`Logger`] at construction.

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use anyhow::Context;
use bookstore_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub mod logger;

pub use logger::{LogEntry, Logger, MemoryLogger, Severity, TracingLogger};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the tracing subscriber described by `settings`.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    match settings.log_format {
        LogFormat::Pretty => layers.push(fmt::layer().with_target(true).boxed()),
        LogFormat::Json => layers.push(fmt::layer().json().boxed()),
    }

    if let Some(path) = &settings.log_file {
        layers.push(file_layer(Path::new(path))?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_filter(settings))
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(
        target: "bookstore-telemetry",
        format = ?settings.log_format,
        log_file = ?settings.log_file,
        "telemetry initialized"
    );

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level applies.
fn build_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

fn file_layer(path: &Path) -> anyhow::Result<BoxedLayer> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Ok(fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .boxed())
}
