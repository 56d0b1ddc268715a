use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use bookshelf_auth::MutatingAction;
use bookshelf_books::{Book, BookPatch, NewBook};
use bookshelf_core::BookId;

use crate::app::AppState;
use crate::app::errors::ApiError;
use crate::authz::authorize_book;
use crate::context::AuthenticatedUser;
use crate::middleware::auth_middleware;

/// Reads are public; create, update and delete go through the auth gate.
pub fn router(state: &AppState) -> Router<AppState> {
    let gate = || axum::middleware::from_fn_with_state(state.auth.clone(), auth_middleware);

    Router::new()
        .route(
            "/",
            get(list_books).merge(post(create_book).route_layer(gate())),
        )
        .route(
            "/:id",
            get(get_book).merge(put(update_book).delete(delete_book).route_layer(gate())),
        )
}

/// An id that does not parse cannot name a stored book.
fn parse_book_id(raw: &str) -> Result<BookId, ApiError> {
    raw.parse().map_err(|_| ApiError::book_not_found())
}

pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books.list().await?;
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_book_id(&id)?;
    let book = state.books.get(id).await?.ok_or_else(ApiError::book_not_found)?;
    Ok(Json(book))
}

pub async fn create_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    body: Result<Json<NewBook>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let valid = request.validate()?;

    let book = Book::create(BookId::new(), actor.id(), valid);
    let created = state.books.insert(book).await?;

    tracing::info!(book_id = %created.id, owner_id = %actor.id(), "book created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<BookPatch>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_book_id(&id)?;
    let mut book = state.books.get(id).await?.ok_or_else(ApiError::book_not_found)?;
    authorize_book(&book, &actor, MutatingAction::Update)?;

    let Json(patch) = body?;
    book.apply_patch(&patch);

    // The book may have been deleted since it was loaded.
    let updated = state.books.update(book).await?.ok_or_else(ApiError::book_not_found)?;

    tracing::info!(book_id = %updated.id, actor_id = %actor.id(), "book updated");
    Ok(Json(updated))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_book_id(&id)?;
    let book = state.books.get(id).await?.ok_or_else(ApiError::book_not_found)?;
    authorize_book(&book, &actor, MutatingAction::Delete)?;

    if !state.books.delete(id).await? {
        return Err(ApiError::book_not_found());
    }

    tracing::info!(book_id = %id, actor_id = %actor.id(), "book removed");
    Ok(Json(serde_json::json!({ "message": "Book removed" })))
}
