//! Decoding of facet counts into the shared facet models.
//!
//! Each configured facet is parsed on its own from the response counts and the selections of the
//! request. A facet that has neither options nor selections is dropped unless empty facets are
//! configured to show.

mod hierarchy;
mod options;
mod query_group;
mod range;

pub use hierarchy::{natural_cmp, parse_hierarchy_facet};
pub use options::parse_options_facet;
pub use query_group::parse_query_group_facet;
pub use range::parse_range_facet;

use common::{search_query::SearchRequest, search_result::Facet};

use crate::{
    config::{FacetType, FacetingConfiguration, NamedFacetConfiguration},
    db_utils::solr_response::SolrResponse,
};

/// Renders option labels for facets that need more than the raw value.
pub trait LabelRenderer: Send + Sync {
    /// Returns `None` to fall back to the configured rendering.
    fn render(&self, facet_name: &str, value: &str, count: u64) -> Option<String>;
}

impl<F> LabelRenderer for F
where
    F: Fn(&str, &str, u64) -> Option<String> + Send + Sync,
{
    fn render(&self, facet_name: &str, value: &str, count: u64) -> Option<String> {
        self(facet_name, value, count)
    }
}

/// Everything a facet parser reads.
#[derive(Clone, Copy)]
pub struct FacetContext<'a> {
    pub faceting: &'a FacetingConfiguration,
    pub request: &'a SearchRequest,
    pub response: &'a SolrResponse,
    pub renderer: Option<&'a dyn LabelRenderer>,
}

impl<'a> FacetContext<'a> {
    pub fn new(faceting: &'a FacetingConfiguration, request: &'a SearchRequest, response: &'a SolrResponse) -> Self {
        Self { faceting, request, response, renderer: None }
    }

    pub fn with_renderer(mut self, renderer: &'a dyn LabelRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Label of one option: the renderer's, else the `renderingInstruction` template with
    /// `{value}` and `{count}` filled in, else the value itself.
    pub fn label(&self, facet: &NamedFacetConfiguration, value: &str, count: u64) -> String {
        if let Some(label) = self.renderer.and_then(|renderer| renderer.render(&facet.name, value, count)) {
            return label;
        }
        match &facet.configuration.rendering_instruction {
            Some(template) => template.replace("{value}", value).replace("{count}", &count.to_string()),
            None => value.to_string(),
        }
    }

    /// Whether a facet with these flags is returned at all.
    pub fn is_shown(&self, facet: &NamedFacetConfiguration, is_available: bool, is_used: bool) -> bool {
        is_available || is_used || self.faceting.shows_empty(facet)
    }
}

/// The facet display label, defaulting to the facet name.
pub fn facet_label(facet: &NamedFacetConfiguration) -> String {
    facet.configuration.label.clone().unwrap_or_else(|| facet.name.clone())
}

/// Parses every configured facet, in configuration order.
pub fn parse_facets(context: &FacetContext<'_>) -> Vec<Facet> {
    context
        .faceting
        .facets
        .iter()
        .filter_map(|facet| parse_facet(context, facet))
        .collect()
}

pub fn parse_facet(context: &FacetContext<'_>, facet: &NamedFacetConfiguration) -> Option<Facet> {
    match facet.configuration.facet_type {
        FacetType::Options => parse_options_facet(context, facet).map(Facet::Options),
        FacetType::Hierarchy => parse_hierarchy_facet(context, facet).map(Facet::Hierarchy),
        FacetType::QueryGroup => parse_query_group_facet(context, facet).map(Facet::QueryGroup),
        FacetType::NumericRange | FacetType::DateRange => parse_range_facet(context, facet).map(Facet::Range),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{Value, json};

    use crate::{config::Configuration, db_utils::solr_response::SolrResponse};

    pub fn faceting(facets: Value) -> crate::config::FacetingConfiguration {
        Configuration::new(json!({"search": {"faceting": {"enabled": 1, "facets": facets}}}))
            .faceting()
            .unwrap()
    }

    pub fn response(facet_counts: Value) -> SolrResponse {
        serde_json::from_value(json!({"facet_counts": facet_counts})).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::{test_support::*, *};
    use serde_json::json;

    #[test]
    fn facets_follow_configuration_order_and_hide_empty_ones() {
        let faceting = faceting(json!({
            "type": {"field": "type"},
            "author": {"field": "author"},
            "category": {"field": "category", "type": "hierarchy"},
        }));
        let response = response(json!({"facet_fields": {
            "category": ["0-a/", 2],
            "type": ["pages", 3],
            "author": [],
        }}));
        let request = SearchRequest::new("hello");
        let facets = parse_facets(&FacetContext::new(&faceting, &request, &response));
        let names: Vec<_> = facets.iter().map(Facet::name).collect();
        assert_eq!(names, vec!["type", "category"]);
    }

    #[test]
    fn empty_facets_can_be_shown() {
        let mut faceting = faceting(json!({"author": {"field": "author", "label": "Author"}}));
        faceting.show_empty_facets = true;
        let response = response(json!({}));
        let request = SearchRequest::new("hello");
        let facets = parse_facets(&FacetContext::new(&faceting, &request, &response));
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].label(), "Author");
        assert!(!facets[0].is_available());
    }

    #[test]
    fn labels_prefer_renderer_then_template() {
        let faceting = faceting(json!({
            "type": {"field": "type", "renderingInstruction": "{value} ({count})"},
        }));
        let response = response(json!({}));
        let request = SearchRequest::new("hello");
        let facet = faceting.facet("type").unwrap();

        let context = FacetContext::new(&faceting, &request, &response);
        assert_eq!(context.label(facet, "pages", 3), "pages (3)");

        let renderer = |_: &str, value: &str, _: u64| (value == "news").then(|| "News".to_string());
        let context = context.with_renderer(&renderer);
        assert_eq!(context.label(facet, "news", 1), "News");
        assert_eq!(context.label(facet, "pages", 3), "pages (3)");
    }
}
