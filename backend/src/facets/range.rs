use common::search_result::{RangeCount, RangeFacet, RangeSelection};

use crate::{config::NamedFacetConfiguration, facets::{FacetContext, facet_label}};

/// Parses a numeric or date range facet from `facet_ranges.<field>` and the `start-end` selection.
pub fn parse_range_facet(context: &FacetContext<'_>, facet: &NamedFacetConfiguration) -> Option<RangeFacet> {
    let configuration = &facet.configuration;
    let selected = context
        .request
        .active_facet_values(&facet.name)
        .iter()
        .find_map(|value| RangeSelection::parse(value));
    let response = context.response.facet_range(&configuration.field);

    let counts: Vec<RangeCount> = response
        .map(|range| {
            range
                .counts
                .iter()
                .map(|(value, count)| RangeCount { value: value.to_string(), count })
                .collect()
        })
        .unwrap_or_default();
    let is_available = counts.iter().any(|count| count.count > 0);
    let is_used = selected.is_some();
    if !context.is_shown(facet, is_available, is_used) {
        return None;
    }

    let bound = |from_response: Option<&String>, configured: Option<&String>| {
        from_response
            .filter(|value| !value.is_empty())
            .or(configured)
            .cloned()
            .unwrap_or_default()
    };
    let configured = configuration.range.as_ref();
    Some(RangeFacet {
        name: facet.name.clone(),
        field: configuration.field.clone(),
        label: facet_label(facet),
        is_used,
        is_available,
        start: bound(response.map(|range| &range.start), configured.map(|range| &range.start)),
        end: bound(response.map(|range| &range.end), configured.map(|range| &range.end)),
        gap: bound(response.map(|range| &range.gap), configured.map(|range| &range.gap)),
        counts,
        selected,
    })
}
