pub mod module;
pub mod registry;
pub mod repository;
pub mod settings;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
pub use repository::{Repository, RepositoryError};
