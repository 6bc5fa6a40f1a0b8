//! Shared search request models and helpers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};


/// One search request as issued by a caller.
///
/// Active facet selections are keyed by the configured facet name, not by the Solr field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchRequest {
    pub query_string: String,
    /// 1-based page number. `0` is treated as the first page.
    pub page: u64,
    pub results_per_page: Option<u64>,
    pub sorting: Option<String>,
    pub facet_filters: BTreeMap<String, BTreeSet<String>>,
    /// Site root page; when set, the request goes to the connection registered for it.
    pub root_page_id: Option<u64>,
    /// Language id of the site, used together with `root_page_id`.
    pub language: u64,
}

impl SearchRequest {
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            page: 1,
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn with_site(mut self, root_page_id: u64, language: u64) -> Self {
        self.root_page_id = Some(root_page_id);
        self.language = language;
        self
    }

    pub fn with_facet_value(mut self, facet_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_facet_value(facet_name, value);
        self
    }

    pub fn add_facet_value(&mut self, facet_name: impl Into<String>, value: impl Into<String>) {
        self.facet_filters.entry(facet_name.into()).or_default().insert(value.into());
    }

    /// Removes one selection; the facet entry disappears with its last value.
    pub fn remove_facet_value(&mut self, facet_name: &str, value: &str) {
        if let Some(values) = self.facet_filters.get_mut(facet_name) {
            values.remove(value);
            if values.is_empty() {
                self.facet_filters.remove(facet_name);
            }
        }
    }

    pub fn active_facet_values(&self, facet_name: &str) -> Vec<String> {
        self.facet_filters
            .get(facet_name)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_active_facet(&self, facet_name: &str) -> bool {
        self.facet_filters.get(facet_name).is_some_and(|values| !values.is_empty())
    }
}
