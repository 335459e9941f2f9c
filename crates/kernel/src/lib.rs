//! Core traits, settings, and module registry shared by every bookshelf crate.

pub mod module;
pub mod registry;
pub mod repository;
pub mod settings;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
pub use repository::{Entity, InMemoryRepository, Repository};
