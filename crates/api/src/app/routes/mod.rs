use axum::{Router, routing::get};

use crate::app::AppState;

pub mod books;
pub mod system;

/// Router for every endpoint. Protected methods carry the auth gate
/// individually; see [`books::router`].
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api/books", books::router(state))
}
