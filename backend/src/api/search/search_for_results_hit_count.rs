use common::search_query::SearchRequest;

use crate::{
    api::{SearchBackend, search::build_query},
    error::SearchError,
};

/// Number of documents matching a request, without fetching any of them.
pub async fn search_for_results_hit_count(backend: &SearchBackend, request: &SearchRequest) -> Result<u64, SearchError> {
    let mut query = build_query(backend.configuration(), request)?;
    query.faceting_mut().set_enabled(false);
    query.set_highlighting(false, None);
    let response = backend.client_for(request)?.search(&query, 0, Some(0)).await?;
    Ok(response.num_found())
}
