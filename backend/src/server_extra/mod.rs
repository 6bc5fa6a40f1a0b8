//! HTTP surface of the search backend.

pub mod search_routes;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::SearchBackend;

/// `POST /search`, `POST /suggest` and `GET /ping`.
pub fn router(backend: SearchBackend) -> Router {
    Router::new()
        .route("/search", post(search_routes::search_handler))
        .route("/suggest", post(search_routes::suggest_handler))
        .route("/ping", get(search_routes::ping_handler))
        .with_state(backend)
}
