pub mod books;

use std::sync::Arc;

use bookshelf_kernel::ModuleRegistry;
use sqlx::SqlitePool;

/// Register all project modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool) {
    registry.register(books::create_module(Arc::new(
        books::SqliteBookRepository::new(pool.clone()),
    )));
}
