use common::{search_query::SearchRequest, search_result::SearchSuggestion};

use crate::{api::SearchBackend, error::SearchError, query::SuggestQuery};

/// Completions for the partially typed keywords of `request`.
pub async fn search_suggestions(
    backend: &SearchBackend,
    request: &SearchRequest,
) -> Result<Vec<SearchSuggestion>, SearchError> {
    let query = SuggestQuery::from_configuration(&request.query_string, backend.configuration());
    backend.client_for(request)?.suggest(&query).await
}
