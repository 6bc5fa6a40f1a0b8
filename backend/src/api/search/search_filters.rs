//! Filter queries for the facet selections of a request.

use common::{
    escape::HierarchyPath,
    search_query::SearchRequest,
    search_result::RangeSelection,
};
use tracing::warn;

use crate::{
    config::{FacetOperator, FacetType, FacetingConfiguration, NamedFacetConfiguration},
    query::Query,
};

/// Name under which the filter of a facet selection is stored on the query.
pub fn facet_filter_name(facet_name: &str) -> String {
    format!("facet:{facet_name}")
}

/// Replaces the facet selection filters of `query` with the ones of `request`.
pub fn apply_facet_filters(query: &mut Query, faceting: &FacetingConfiguration, request: &SearchRequest) {
    for facet in &faceting.facets {
        let name = facet_filter_name(&facet.name);
        query.filters_mut().remove_by_name(&name);
        if let Some(expression) = facet_filter_expression(faceting, facet, request) {
            query.filters_mut().add(expression, Some(name.as_str()));
        }
    }
}

/// The `fq` expression selecting the active values of one facet, if any are active.
///
/// Facets that keep all of their options while selected tag their filter with the facet name so
/// the faceting parameters can exclude it.
pub fn facet_filter_expression(
    faceting: &FacetingConfiguration,
    facet: &NamedFacetConfiguration,
    request: &SearchRequest,
) -> Option<String> {
    let configuration = &facet.configuration;
    let field = &configuration.field;
    let values = request.active_facet_values(&facet.name);
    let terms: Vec<String> = match configuration.facet_type {
        FacetType::Options => values
            .iter()
            .map(|value| format!("{field}:{}", quote(value)))
            .collect(),
        FacetType::Hierarchy => values
            .iter()
            .filter_map(|value| match HierarchyPath::from_request_value(value) {
                Ok(path) => Some(format!("{field}:{}", quote(&path.encode()))),
                Err(error) => {
                    warn!(facet = %facet.name, %error, "ignoring malformed hierarchy selection");
                    None
                }
            })
            .collect(),
        FacetType::NumericRange | FacetType::DateRange => values
            .iter()
            .filter_map(|value| {
                let range = RangeSelection::parse(value);
                if range.is_none() {
                    warn!(facet = %facet.name, value = %value, "ignoring malformed range selection");
                }
                range
            })
            .take(1)
            .map(|range| format!("{field}:[{} TO {}]", range.start, range.end))
            .collect(),
        FacetType::QueryGroup => values
            .iter()
            .filter_map(|value| {
                configuration
                    .query_group
                    .iter()
                    .find(|(option_name, _)| option_name == value)
                    .map(|(_, option)| format!("{field}:{}", option.query))
            })
            .collect(),
    };

    let expression = match terms.len() {
        0 => return None,
        1 => terms.into_iter().next()?,
        _ => {
            let operator = match configuration.operator {
                FacetOperator::And if configuration.facet_type == FacetType::Options => " AND ",
                _ => " OR ",
            };
            format!("({})", terms.join(operator))
        }
    };
    if faceting.keeps_all_options(facet) {
        Some(format!("{{!tag={}}}{expression}", facet.name))
    } else {
        Some(expression)
    }
}

/// Quotes a term, escaping `"` and `\`.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
