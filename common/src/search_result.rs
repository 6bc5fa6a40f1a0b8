use serde::{Deserialize, Serialize};

use crate::{hierarchy_facet::HierarchyFacet, search_query::SearchRequest, text_highlight::HighlightTextSpan};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub request: SearchRequest,
    /// The `q` parameter that produced these results.
    pub query_string: String,
    /// Set when the results come from a spelling-corrected re-query.
    pub corrected_query_string: Option<String>,
    pub num_found: u64,
    pub start: u64,
    pub max_score: Option<f64>,
    pub query_time_ms: u64,
    pub page_number: u64,
    pub results: Vec<SearchResultDocumentItem>,
    pub groups: Vec<SearchResultGroup>,
    pub spelling_suggestions: Vec<SpellingSuggestion>,
    pub facets: Vec<Facet>,
}

impl SearchResultSet {
    pub fn facet(&self, name: &str) -> Option<&Facet> {
        self.facets.iter().find(|facet| facet.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultDocumentItem {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub document_type: Option<String>,
    pub score: Option<f64>,
    pub is_elevated: bool,
    pub highlight_text_spans: Vec<HighlightTextSpan>,
    /// Collapsed variants of this document, filled when variant expansion is on.
    pub variants: Vec<SearchResultDocumentItem>,
    pub result_index_in_page: u64,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultGroup {
    /// Grouped field name, or the group query for query groups.
    pub group_name: String,
    pub group_value: Option<String>,
    pub num_found: u64,
    pub documents: Vec<SearchResultDocumentItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellingSuggestion {
    pub collation: String,
    pub hits: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub text: String,
    pub count: u64,
}

/// A parsed facet, in the shape that matches its configured type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Facet {
    Options(SearchResultFacets),
    QueryGroup(SearchResultFacets),
    Hierarchy(HierarchyFacet),
    Range(RangeFacet),
}

impl Facet {
    pub fn name(&self) -> &str {
        match self {
            Facet::Options(facet) | Facet::QueryGroup(facet) => &facet.name,
            Facet::Hierarchy(facet) => &facet.name,
            Facet::Range(facet) => &facet.name,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Facet::Options(facet) | Facet::QueryGroup(facet) => &facet.field,
            Facet::Hierarchy(facet) => &facet.field,
            Facet::Range(facet) => &facet.field,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Facet::Options(facet) | Facet::QueryGroup(facet) => &facet.label,
            Facet::Hierarchy(facet) => &facet.label,
            Facet::Range(facet) => &facet.label,
        }
    }

    pub fn is_used(&self) -> bool {
        match self {
            Facet::Options(facet) | Facet::QueryGroup(facet) => facet.is_used,
            Facet::Hierarchy(facet) => facet.is_used,
            Facet::Range(facet) => facet.is_used,
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Facet::Options(facet) | Facet::QueryGroup(facet) => facet.is_available,
            Facet::Hierarchy(facet) => facet.is_available,
            Facet::Range(facet) => facet.is_available,
        }
    }
}

/// A flat facet: plain field options or configured query groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultFacets {
    pub name: String,
    pub field: String,
    pub label: String,
    pub is_used: bool,
    pub is_available: bool,
    pub facet_values: Vec<SearchResultFacetItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultFacetItem {
    pub display_string: String,
    pub value: String,
    pub count: u64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFacet {
    pub name: String,
    pub field: String,
    pub label: String,
    pub is_used: bool,
    pub is_available: bool,
    pub start: String,
    pub end: String,
    pub gap: String,
    pub counts: Vec<RangeCount>,
    pub selected: Option<RangeSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCount {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub start: String,
    pub end: String,
}

impl RangeSelection {
    /// Parses the `start-end` request form, or `start TO end`.
    ///
    /// A leading `-` belongs to the start value, so `-10--5` is the range from -10 to -5. Bounds
    /// are single terms of letters, digits and `.+-:/*_`, so they can be put between brackets
    /// as they are.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some((start, end)) = value.split_once(" TO ") {
            return Self::non_empty(start, end);
        }
        let separator = value.get(1..)?.find('-')? + 1;
        Self::non_empty(&value[..separator], &value[separator + 1..])
    }

    fn non_empty(start: &str, end: &str) -> Option<Self> {
        let (start, end) = (start.trim(), end.trim());
        if !is_range_bound(start) || !is_range_bound(end) {
            return None;
        }
        Some(Self { start: start.to_string(), end: end.to_string() })
    }
}

fn is_range_bound(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | ':' | '/' | '*' | '_'))
}
