use common::search_result::{SearchResultFacetItem, SearchResultFacets};

use crate::{
    config::NamedFacetConfiguration,
    facets::{FacetContext, facet_label},
    query::query_group_facet_query,
};

/// Parses a query group facet: one option per configured query, counted from `facet_queries`.
///
/// Options without hits are left out unless selected.
pub fn parse_query_group_facet(context: &FacetContext<'_>, facet: &NamedFacetConfiguration) -> Option<SearchResultFacets> {
    let active = context.request.active_facet_values(&facet.name);
    let mut is_available = false;
    let mut items = Vec::new();
    for (option_name, option) in &facet.configuration.query_group {
        let facet_query = query_group_facet_query(context.faceting, facet, &option.query);
        let count = context.response.facet_query(&facet_query).unwrap_or(0);
        let selected = active.iter().any(|value| value == option_name);
        is_available |= count > 0;
        if count == 0 && !selected {
            continue;
        }
        items.push(SearchResultFacetItem {
            display_string: context.label(facet, option_name, count),
            value: option_name.clone(),
            count,
            selected,
        });
    }
    let is_used = !active.is_empty();
    if !context.is_shown(facet, is_available, is_used) {
        return None;
    }
    if facet.configuration.reverse_order {
        items.reverse();
    }
    Some(SearchResultFacets {
        name: facet.name.clone(),
        field: facet.configuration.field.clone(),
        label: facet_label(facet),
        is_used,
        is_available,
        facet_values: items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::test_support::*;
    use common::search_query::SearchRequest;
    use serde_json::json;

    #[test]
    fn counts_each_configured_query() {
        let faceting = faceting(json!({"age": {
            "field": "created",
            "type": "queryGroup",
            "keepAllOptionsOnSelection": 1,
            "queryGroup": {
                "week": {"query": "[NOW/DAY-7DAYS TO *]"},
                "month": {"query": "[NOW/DAY-1MONTH TO NOW/DAY-7DAYS]"},
                "old": {"query": "[* TO NOW/DAY-1MONTH]"},
            },
        }}));
        let response = response(json!({"facet_queries": {
            "{!ex=age}created:[NOW/DAY-7DAYS TO *]": 4,
            "{!ex=age}created:[NOW/DAY-1MONTH TO NOW/DAY-7DAYS]": 0,
            "{!ex=age}created:[* TO NOW/DAY-1MONTH]": 9,
        }}));
        let request = SearchRequest::new("hello").with_facet_value("age", "month");
        let context = FacetContext::new(&faceting, &request, &response);
        let facet = parse_query_group_facet(&context, faceting.facet("age").unwrap()).unwrap();

        let values: Vec<_> = facet
            .facet_values
            .iter()
            .map(|item| (item.value.as_str(), item.count, item.selected))
            .collect();
        assert_eq!(values, vec![("week", 4, false), ("month", 0, true), ("old", 9, false)]);
        assert!(facet.is_available);
        assert!(facet.is_used);
    }
}
