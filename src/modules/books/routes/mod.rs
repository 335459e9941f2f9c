//! HTTP handlers for the book resource.
//!
//! Each handler checks at most one precondition on the identifier and then
//! delegates straight to the repository.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::error::{AppError, AppResult};
use bookshelf_kernel::Repository;

use super::models::{Book, BookId};

/// Persistence collaborator shared by all handlers.
pub type BookRepository = Arc<dyn Repository<Book>>;

/// Book routes, relative to the module mount point.
pub fn router(repository: BookRepository) -> Router {
    Router::new()
        .route("/", get(find_all).post(create).put(update))
        .route("/{id}", get(find_one_by_id).delete(delete))
        .with_state(repository)
}

async fn find_all(State(repository): State<BookRepository>) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(repository.find_all().await?))
}

async fn find_one_by_id(
    State(repository): State<BookRepository>,
    Path(id): Path<BookId>,
) -> AppResult<Json<Book>> {
    repository
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("book {} not found", id)))
}

async fn create(
    State(repository): State<BookRepository>,
    Json(book): Json<Book>,
) -> AppResult<(StatusCode, Json<Book>)> {
    if let Some(id) = book.id {
        tracing::warn!(book_id = id, "attempted to create a book that already has an id");
        return Err(AppError::bad_request("a new book must not carry an id"));
    }

    let saved = repository.save(book).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn update(
    State(repository): State<BookRepository>,
    Json(book): Json<Book>,
) -> AppResult<Json<Book>> {
    if book.id.is_none() {
        tracing::warn!("attempted to update a book without an id");
        return Err(AppError::bad_request("an updated book must carry its id"));
    }

    Ok(Json(repository.save(book).await?))
}

async fn delete(
    State(repository): State<BookRepository>,
    Path(id): Path<BookId>,
) -> AppResult<StatusCode> {
    if !repository.exists_by_id(id).await? {
        tracing::warn!(book_id = id, "attempted to delete a book that does not exist");
        return Err(AppError::not_found(format!("book {} not found", id)));
    }

    repository.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
