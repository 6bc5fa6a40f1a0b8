use common::search_result::{SearchResultFacetItem, SearchResultFacets};

use crate::{config::NamedFacetConfiguration, facets::{FacetContext, facet_label}};

/// Parses a flat options facet from `facet_fields.<field>`.
///
/// Selected values missing from the response are kept with a count of 0 so they stay removable.
pub fn parse_options_facet(context: &FacetContext<'_>, facet: &NamedFacetConfiguration) -> Option<SearchResultFacets> {
    let configuration = &facet.configuration;
    let active = context.request.active_facet_values(&facet.name);

    let mut items: Vec<SearchResultFacetItem> = Vec::new();
    if let Some(counts) = context.response.facet_field(&configuration.field) {
        for (value, count) in counts.iter() {
            if configuration.is_excluded(value) || items.iter().any(|item| item.value == value) {
                continue;
            }
            items.push(option_item(context, facet, value, count, &active));
        }
    }
    let is_available = !items.is_empty();
    for value in &active {
        if !items.iter().any(|item| &item.value == value) {
            items.push(option_item(context, facet, value, 0, &active));
        }
    }
    let is_used = !active.is_empty();
    if !context.is_shown(facet, is_available, is_used) {
        return None;
    }

    if !configuration.manual_sort_order.is_empty() {
        let position = |item: &SearchResultFacetItem| {
            configuration
                .manual_sort_order
                .iter()
                .position(|value| *value == item.value)
                .unwrap_or(usize::MAX)
        };
        items.sort_by_key(position);
    }
    if configuration.reverse_order {
        items.reverse();
    }

    Some(SearchResultFacets {
        name: facet.name.clone(),
        field: configuration.field.clone(),
        label: facet_label(facet),
        is_used,
        is_available,
        facet_values: items,
    })
}

fn option_item(
    context: &FacetContext<'_>,
    facet: &NamedFacetConfiguration,
    value: &str,
    count: u64,
    active: &[String],
) -> SearchResultFacetItem {
    SearchResultFacetItem {
        display_string: context.label(facet, value, count),
        value: value.to_string(),
        count,
        selected: active.iter().any(|selected| selected == value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::test_support::*;
    use common::search_query::SearchRequest;
    use serde_json::json;

    fn values(facet: &SearchResultFacets) -> Vec<(&str, u64, bool)> {
        facet
            .facet_values
            .iter()
            .map(|item| (item.value.as_str(), item.count, item.selected))
            .collect()
    }

    #[test]
    fn merges_response_and_selection() {
        let faceting = faceting(json!({"type": {"field": "type", "excludeValues": "tx_hidden"}}));
        let response = response(json!({"facet_fields": {"type": ["pages", 10, "tx_hidden", 4, "news", 3]}}));
        let request = SearchRequest::new("hello")
            .with_facet_value("type", "news")
            .with_facet_value("type", "events");
        let context = FacetContext::new(&faceting, &request, &response);
        let facet = parse_options_facet(&context, faceting.facet("type").unwrap()).unwrap();

        assert!(facet.is_used);
        assert!(facet.is_available);
        assert_eq!(
            values(&facet),
            vec![("pages", 10, false), ("news", 3, true), ("events", 0, true)]
        );
    }

    #[test]
    fn manual_and_reverse_order() {
        let faceting = faceting(json!({"type": {
            "field": "type",
            "manualSortOrder": ["news", "events"],
            "reverseOrder": true,
        }}));
        let response = response(json!({"facet_fields": {"type": ["pages", 10, "events", 4, "news", 3, "blog", 1]}}));
        let request = SearchRequest::new("hello");
        let context = FacetContext::new(&faceting, &request, &response);
        let facet = parse_options_facet(&context, faceting.facet("type").unwrap()).unwrap();
        let order: Vec<_> = facet.facet_values.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(order, vec!["blog", "pages", "events", "news"]);
    }

    #[test]
    fn facet_without_options_or_selection_is_absent() {
        let faceting = faceting(json!({"type": {"field": "type"}}));
        let response = response(json!({"facet_fields": {"type": []}}));
        let request = SearchRequest::new("hello");
        let context = FacetContext::new(&faceting, &request, &response);
        assert!(parse_options_facet(&context, faceting.facet("type").unwrap()).is_none());
    }
}
