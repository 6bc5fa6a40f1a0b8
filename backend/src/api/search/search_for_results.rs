//! Search endpoint for result lists.

use common::{
    search_query::SearchRequest,
    search_result::{SearchResultDocumentItem, SearchResultGroup, SearchResultSet, SpellingSuggestion},
};
use serde_json::Value;
use tracing::info;

use crate::{
    api::{SearchBackend, search::search_filters::apply_facet_filters},
    config::Configuration,
    db_utils::{
        decompose_spans::decompose_text_into_spans,
        solr_response::{SolrDocument, SolrResponse},
    },
    error::{ConfigError, SearchError},
    facets::{FacetContext, parse_facets},
    query::Query,
};

/// Builds the query for a request: configured defaults, paging, sorting, variants, elevation and
/// the facet selection filters.
pub fn build_query(configuration: &Configuration, request: &SearchRequest) -> Result<Query, ConfigError> {
    let mut query = Query::from_configuration(&request.query_string, configuration)?;
    query.set_page(request.page.max(1));
    if let Some(results_per_page) = request.results_per_page {
        query.set_results_per_page(results_per_page);
    }
    if let Some(sorting) = &request.sorting {
        query.set_sorting(sorting)?;
    }
    query.set_collapsing(configuration.bool("search.variants", false));
    if configuration.bool("search.elevation", false) {
        query.set_query_elevation(
            true,
            configuration.bool("search.elevation.forceElevation", true),
            configuration.bool("search.elevation.markElevatedResults", true),
        );
    }
    let faceting = query.faceting().configuration().clone();
    apply_facet_filters(&mut query, &faceting, request);
    Ok(query)
}

/// Runs a search and maps the response into a result set.
///
/// When nothing is found, spellchecking is on and `search.spellchecking.searchUsingSpellCheckerSuggestion`
/// is set, the search is repeated once with the first collation Solr suggested.
pub async fn search_for_results(backend: &SearchBackend, request: &SearchRequest) -> Result<SearchResultSet, SearchError> {
    let configuration = backend.configuration();
    let client = backend.client_for(request)?;
    let mut query = build_query(configuration, request)?;
    let mut response = client.search(&query, query.offset(), None).await?;
    let mut corrected_query_string = None;

    let spelling_suggestions = spelling_suggestions(&response);
    if response.num_found() == 0
        && query.spellchecking().is_enabled()
        && configuration.bool("search.spellchecking.searchUsingSpellCheckerSuggestion", false)
    {
        if let Some(suggestion) = spelling_suggestions.first() {
            let mut corrected = query.clone();
            corrected.set_keywords(&suggestion.collation);
            corrected.use_raw_query_string(true);
            info!(
                original = query.query_string(),
                corrected = corrected.query_string(),
                "repeating search with spelling suggestion"
            );
            response = client.search(&corrected, corrected.offset(), None).await?;
            corrected_query_string = Some(suggestion.collation.clone());
            query = corrected;
        }
    }

    let results = map_documents(&query, &response, response.documents(), true);
    let groups = map_groups(&query, &response);
    let facets = if query.faceting().is_enabled() {
        let mut context = FacetContext::new(query.faceting().configuration(), request, &response);
        if let Some(renderer) = backend.label_renderer() {
            context = context.with_renderer(renderer);
        }
        parse_facets(&context)
    } else {
        Vec::new()
    };
    let list = response.response.as_ref();

    Ok(SearchResultSet {
        request: request.clone(),
        query_string: query.query_string().to_string(),
        corrected_query_string,
        num_found: response.num_found(),
        start: list.map_or(query.offset(), |list| list.start),
        max_score: list.and_then(|list| list.max_score),
        query_time_ms: response.response_header.q_time,
        page_number: query.page(),
        results,
        groups,
        spelling_suggestions,
        facets,
    })
}

fn spelling_suggestions(response: &SolrResponse) -> Vec<SpellingSuggestion> {
    response
        .spellcheck
        .as_ref()
        .map(|spellcheck| {
            spellcheck
                .collations()
                .into_iter()
                .map(|collation| SpellingSuggestion { collation: collation.query, hits: collation.hits })
                .collect()
        })
        .unwrap_or_default()
}

fn map_groups(query: &Query, response: &SolrResponse) -> Vec<SearchResultGroup> {
    let mut groups = Vec::new();
    for (name, grouped) in &response.grouped {
        for group in &grouped.groups {
            groups.push(SearchResultGroup {
                group_name: name.clone(),
                group_value: scalar(&group.group_value),
                num_found: group.doclist.num_found,
                documents: map_documents(query, response, &group.doclist.docs, true),
            });
        }
        if let Some(doclist) = &grouped.doclist {
            groups.push(SearchResultGroup {
                group_name: name.clone(),
                group_value: None,
                num_found: doclist.num_found,
                documents: map_documents(query, response, &doclist.docs, true),
            });
        }
    }
    groups
}

fn map_documents(
    query: &Query,
    response: &SolrResponse,
    documents: &[SolrDocument],
    with_variants: bool,
) -> Vec<SearchResultDocumentItem> {
    documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let id = field(document, "id").unwrap_or_default();
            let variants = match field(document, query.variant_field()) {
                Some(collapse_value) if with_variants && query.is_collapsing() => response
                    .expanded_for(&collapse_value)
                    .map(|variants| map_documents(query, response, &variants.docs, false))
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            SearchResultDocumentItem {
                title: field(document, "title").unwrap_or_default(),
                url: field(document, "url"),
                document_type: field(document, "type"),
                score: document.get("score").and_then(Value::as_f64),
                is_elevated: ["isElevated", "[elevated]"]
                    .iter()
                    .any(|marker| document.get(*marker).and_then(Value::as_bool).unwrap_or(false)),
                highlight_text_spans: highlight_spans(query, response, &id),
                variants,
                result_index_in_page: index as u64,
                fields: document.clone(),
                id,
            }
        })
        .collect()
}

fn highlight_spans(query: &Query, response: &SolrResponse, id: &str) -> Vec<common::text_highlight::HighlightTextSpan> {
    let highlighting = query.highlighting();
    if !highlighting.is_enabled() {
        return Vec::new();
    }
    let Some(snippets) = response.highlighting_for(id) else {
        return Vec::new();
    };
    let text = highlighting
        .fields()
        .iter()
        .find_map(|field| snippets.field(field).map(|values| values.join(" ... ")))
        .unwrap_or_default();
    decompose_text_into_spans(&text, highlighting.prefix(), highlighting.postfix())
}

/// A document field as a string; the first value of a multi-valued field.
fn field(document: &SolrDocument, name: &str) -> Option<String> {
    match document.get(name)? {
        Value::Array(values) => values.first().and_then(scalar),
        value => scalar(value),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
