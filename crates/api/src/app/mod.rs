//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use bookshelf_auth::TokenVerifier;
use bookshelf_infra::{BookStore, UserStore};

use crate::middleware::AuthState;

pub mod errors;
pub mod routes;

/// Shared, read-only state built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(
        books: Arc<dyn BookStore>,
        users: Arc<dyn UserStore>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            books,
            auth: AuthState { verifier, users },
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    routes::router(&state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
