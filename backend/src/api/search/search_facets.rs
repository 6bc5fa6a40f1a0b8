//! Facets of a request, without the result list.

use common::{search_query::SearchRequest, search_result::Facet};

use crate::{
    api::{SearchBackend, search::build_query},
    error::SearchError,
    facets::{FacetContext, parse_facets},
};

pub async fn search_facets(backend: &SearchBackend, request: &SearchRequest) -> Result<Vec<Facet>, SearchError> {
    let mut query = build_query(backend.configuration(), request)?;
    if !query.faceting().is_enabled() {
        return Ok(Vec::new());
    }
    query.set_highlighting(false, None);
    query.grouping_mut().set_enabled(false);
    let response = backend.client_for(request)?.search(&query, 0, Some(0)).await?;

    let mut context = FacetContext::new(query.faceting().configuration(), request, &response);
    if let Some(renderer) = backend.label_renderer() {
        context = context.with_renderer(renderer);
    }
    Ok(parse_facets(&context))
}
