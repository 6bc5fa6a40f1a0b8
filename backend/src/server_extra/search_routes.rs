use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{
    search_query::SearchRequest,
    search_result::{SearchResultSet, SearchSuggestion},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    api::{SearchBackend, search},
    error::SearchError,
};

const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// A [`SearchError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub SearchError);

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SearchError::Communication(_) | SearchError::Decode { .. } => StatusCode::BAD_GATEWAY,
            SearchError::NoConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::Config(_) => StatusCode::BAD_REQUEST,
        };
        warn!(%status, error = %self.0, "search request failed");
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

pub async fn search_handler(
    State(backend): State<SearchBackend>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResultSet>, ApiError> {
    info!(query_string = %request.query_string, page = request.page, "search");
    Ok(Json(search::search_for_results(&backend, &request).await?))
}

pub async fn suggest_handler(
    State(backend): State<SearchBackend>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchSuggestion>>, ApiError> {
    Ok(Json(search::search_suggestions(&backend, &request).await?))
}

#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub available: bool,
}

pub async fn ping_handler(State(backend): State<SearchBackend>) -> Result<(StatusCode, Json<PingResponse>), ApiError> {
    let client = backend.client().map_err(SearchError::from)?;
    let available = client.ping(PING_TIMEOUT, false).await;
    let status = if available { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    Ok((status, Json(PingResponse { available })))
}
