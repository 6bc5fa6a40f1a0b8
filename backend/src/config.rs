//! Hierarchical key-value configuration.
//!
//! The configuration is a JSON tree addressed with dotted paths such as `search.query.fields`.
//! Lenient getters fall back to a default when a key is missing or has the wrong shape; strict
//! lookups report [`ConfigError`].

use std::path::Path;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    root: Value,
}

impl Configuration {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Looks up a dotted path. Malformed paths and missing keys both yield `None`.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.value_by_path(path).ok()
    }

    /// Looks up a dotted path, failing on malformed paths and missing keys.
    pub fn value_by_path(&self, path: &str) -> Result<&Value, ConfigError> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(ConfigError::InvalidPath { path: path.to_string() });
        }
        let mut current = &self.root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| ConfigError::InvalidPath { path: path.to_string() })?;
        }
        Ok(current)
    }

    /// Sets a value, creating intermediate objects. Non-object intermediates are replaced.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(ConfigError::InvalidPath { path: path.to_string() });
        }
        let mut current = &mut self.root;
        for segment in path.split('.') {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            let map = current
                .as_object_mut()
                .ok_or_else(|| ConfigError::InvalidPath { path: path.to_string() })?;
            current = map.entry(segment.to_string()).or_insert(Value::Null);
        }
        *current = value;
        Ok(())
    }

    pub fn string(&self, path: &str, default: &str) -> String {
        self.optional_string(path).unwrap_or_else(|| default.to_string())
    }

    /// A scalar rendered as a string. Empty strings count as unset.
    pub fn optional_string(&self, path: &str) -> Option<String> {
        match self.value(path)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Accepts `true`/`false`, numbers (non-zero is true) and the strings `"1"`, `"0"`,
    /// `"true"`, `"false"`. A switch written as an object with an `enabled` key (so that options
    /// can sit next to it) reads that key.
    pub fn bool(&self, path: &str, default: bool) -> bool {
        self.value(path).and_then(switch_value).unwrap_or(default)
    }

    pub fn u64(&self, path: &str, default: u64) -> u64 {
        match self.value(path) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// A list given either as an array or as a comma separated string. Items are trimmed and
    /// empty items dropped.
    pub fn string_list(&self, path: &str, default: &[&str]) -> Vec<String> {
        match self.value(path) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|item| !item.is_empty())
                .collect(),
            Some(Value::String(s)) => split_list(s),
            _ => default.iter().map(|item| item.to_string()).collect(),
        }
    }

    /// Deserializes the sub-tree at `path`. A missing key is `Ok(None)`.
    pub fn deserialize<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        let Some(value) = self.value(path) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| ConfigError::InvalidValue {
                path: path.to_string(),
                message: source.to_string(),
            })
    }

    pub fn is_query_string_logging_enabled(&self) -> bool {
        self.bool("logging.query.queryString", false)
    }

    pub fn is_raw_response_logging_enabled(&self) -> bool {
        self.bool("logging.query.rawGet", false)
    }

    pub fn is_exception_logging_enabled(&self) -> bool {
        self.bool("logging.exceptions", false)
    }

    pub fn results_per_page(&self) -> u64 {
        self.u64("search.results.resultsPerPage", 10)
    }

    /// The faceting block, with the facet configurations in declaration order.
    pub fn faceting(&self) -> Result<FacetingConfiguration, ConfigError> {
        let mut faceting = FacetingConfiguration {
            enabled: self.bool("search.faceting", false),
            minimum_count: self.u64("search.faceting.minimumCount", 1),
            limit: self.u64("search.faceting.limit", 100),
            sort_by: self.optional_string("search.faceting.sortBy"),
            show_empty_facets: self.bool("search.faceting.showEmptyFacets", false),
            keep_all_facets_on_selection: self.bool("search.faceting.keepAllFacetsOnSelection", false),
            facets: Vec::new(),
        };
        if let Some(Value::Object(facets)) = self.value("search.faceting.facets") {
            for (name, raw) in facets {
                let facet: FacetConfiguration = serde_json::from_value(raw.clone()).map_err(|source| {
                    ConfigError::InvalidValue {
                        path: format!("search.faceting.facets.{name}"),
                        message: source.to_string(),
                    }
                })?;
                faceting.facets.push(NamedFacetConfiguration {
                    name: name.clone(),
                    configuration: facet,
                    raw: raw.clone(),
                });
            }
        }
        Ok(faceting)
    }
}

/// Reads a switch the way [`Configuration::bool`] does. `None` when the value is not a switch.
fn switch_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        Value::Object(map) => map.get("enabled").and_then(switch_value),
        _ => None,
    }
}

/// Splits a comma separated list, trimming items and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetingConfiguration {
    pub enabled: bool,
    pub minimum_count: u64,
    pub limit: u64,
    pub sort_by: Option<String>,
    pub show_empty_facets: bool,
    pub keep_all_facets_on_selection: bool,
    pub facets: Vec<NamedFacetConfiguration>,
}

impl FacetingConfiguration {
    pub fn facet(&self, name: &str) -> Option<&NamedFacetConfiguration> {
        self.facets.iter().find(|facet| facet.name == name)
    }

    /// Whether an empty facet is still rendered.
    pub fn shows_empty(&self, facet: &NamedFacetConfiguration) -> bool {
        facet.configuration.show_empty_facets.unwrap_or(self.show_empty_facets)
    }

    /// Whether active selections of this facet are excluded when counting its options.
    pub fn keeps_all_options(&self, facet: &NamedFacetConfiguration) -> bool {
        self.keep_all_facets_on_selection || facet.configuration.keep_all_options_on_selection
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedFacetConfiguration {
    pub name: String,
    pub configuration: FacetConfiguration,
    /// The block as written, handed to the facet models.
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetType {
    #[default]
    Options,
    Hierarchy,
    QueryGroup,
    NumericRange,
    DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FacetOperator {
    And,
    #[default]
    Or,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacetConfiguration {
    pub field: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub facet_type: FacetType,
    pub sort_by: Option<String>,
    #[serde(deserialize_with = "deserialize_list")]
    pub exclude_values: Vec<String>,
    #[serde(deserialize_with = "deserialize_optional_switch")]
    pub show_empty_facets: Option<bool>,
    #[serde(deserialize_with = "deserialize_switch")]
    pub keep_all_options_on_selection: bool,
    #[serde(deserialize_with = "deserialize_list")]
    pub manual_sort_order: Vec<String>,
    #[serde(deserialize_with = "deserialize_switch")]
    pub reverse_order: bool,
    pub operator: FacetOperator,
    /// Label template with `{value}` and `{count}` placeholders.
    pub rendering_instruction: Option<String>,
    /// Query group options in declaration order.
    #[serde(deserialize_with = "deserialize_query_groups")]
    pub query_group: Vec<(String, QueryGroupOption)>,
    pub range: Option<RangeConfiguration>,
}

impl FacetConfiguration {
    pub fn is_excluded(&self, value: &str) -> bool {
        self.exclude_values.iter().any(|excluded| excluded == value)
    }

    pub fn sorts_by_index(&self) -> bool {
        matches!(self.sort_by.as_deref(), Some("index" | "lex" | "alpha"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryGroupOption {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RangeConfiguration {
    #[serde(deserialize_with = "deserialize_scalar")]
    pub start: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub end: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub gap: String,
}

fn deserialize_switch<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    switch_value(&value).ok_or_else(|| serde::de::Error::custom(format!("expected a switch, got {value}")))
}

fn deserialize_optional_switch<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => switch_value(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a switch, got {value}"))),
    }
}

fn deserialize_list<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        String(String),
    }
    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items.into_iter().map(|item| item.trim().to_string()).collect(),
        ListOrString::String(s) => split_list(&s),
    })
}

fn deserialize_query_groups<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, QueryGroupOption)>, D::Error> {
    let options = serde_json::Map::<String, Value>::deserialize(deserializer)?;
    options
        .into_iter()
        .map(|(name, option)| {
            serde_json::from_value(option)
                .map(|option| (name, option))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

fn deserialize_scalar<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected a string or number, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn configuration() -> Configuration {
        Configuration::new(json!({
            "search": {
                "query": {
                    "fields": "title^5, content",
                    "returnFields": ["*", "score"],
                },
                "faceting": {
                    "enabled": "1",
                    "minimumCount": "2",
                    "facets": {
                        "type": {"field": "type", "excludeValues": "tx_news, pages "},
                        "category": {"field": "category_stringM", "type": "hierarchy", "sortBy": "index"},
                        "price": {"field": "price_f", "type": "numericRange", "range": {"start": 0, "end": 100, "gap": 10}},
                    },
                },
            },
            "logging": {"exceptions": 1},
        }))
    }

    #[test]
    fn dotted_lookup() {
        let config = configuration();
        assert_eq!(config.string("search.query.fields", ""), "title^5, content");
        assert_eq!(config.string("search.query.missing", "x"), "x");
        assert_eq!(config.string_list("search.query.returnFields", &[]), vec!["*", "score"]);
        assert!(config.is_exception_logging_enabled());
        assert!(!config.is_query_string_logging_enabled());
    }

    #[test]
    fn strict_lookup_reports_invalid_paths() {
        let config = configuration();
        assert!(matches!(config.value_by_path("search..query"), Err(ConfigError::InvalidPath { .. })));
        assert!(matches!(config.value_by_path("search.nope"), Err(ConfigError::InvalidPath { .. })));
        assert!(config.value_by_path("search.query").is_ok());
    }

    #[test]
    fn switch_objects_read_their_enabled_key() {
        let config = configuration();
        assert!(config.bool("search.faceting", false));
        assert_eq!(config.u64("search.faceting.minimumCount", 1), 2);
    }

    #[test]
    fn facet_switches_accept_numbers_and_strings() {
        let config = Configuration::new(json!({
            "search": {"faceting": {"facets": {
                "type": {"field": "type", "keepAllOptionsOnSelection": 1, "reverseOrder": "1", "showEmptyFacets": 0},
                "author": {"field": "author", "reverseOrder": "false", "showEmptyFacets": null},
            }}}
        }));
        let faceting = config.faceting().unwrap();
        let facet = &faceting.facet("type").unwrap().configuration;
        assert!(facet.keep_all_options_on_selection);
        assert!(facet.reverse_order);
        assert_eq!(facet.show_empty_facets, Some(false));

        let author = &faceting.facet("author").unwrap().configuration;
        assert!(!author.reverse_order);
        assert!(!author.keep_all_options_on_selection);
        assert_eq!(author.show_empty_facets, None);

        let broken = Configuration::new(json!({
            "search": {"faceting": {"facets": {"type": {"field": "type", "reverseOrder": "sometimes"}}}}
        }));
        assert!(matches!(broken.faceting(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut config = Configuration::default();
        config.set("search.variants.variantField", json!("variantId")).unwrap();
        assert_eq!(config.string("search.variants.variantField", ""), "variantId");
        assert!(config.set("a..b", json!(1)).is_err());
    }

    #[test]
    fn faceting_block_keeps_declaration_order() {
        let faceting = configuration().faceting().unwrap();
        assert!(faceting.enabled);
        assert_eq!(faceting.minimum_count, 2);
        let names: Vec<_> = faceting.facets.iter().map(|facet| facet.name.as_str()).collect();
        assert_eq!(names, vec!["type", "category", "price"]);

        let facet = faceting.facet("type").unwrap();
        assert_eq!(facet.configuration.exclude_values, vec!["tx_news", "pages"]);
        assert!(facet.configuration.is_excluded("pages"));

        let category = faceting.facet("category").unwrap();
        assert_eq!(category.configuration.facet_type, FacetType::Hierarchy);
        assert!(category.configuration.sorts_by_index());

        let price = faceting.facet("price").unwrap();
        assert_eq!(price.configuration.range.as_ref().unwrap().gap, "10");
    }

    #[test]
    fn invalid_facet_block_is_reported() {
        let config = Configuration::new(json!({
            "search": {"faceting": {"facets": {"bad": {"type": "unknown"}}}}
        }));
        assert!(matches!(config.faceting(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        std::fs::write(&path, r#"{"search": {"results": {"resultsPerPage": 25}}}"#).unwrap();
        assert_eq!(Configuration::from_file(&path).unwrap().results_per_page(), 25);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Configuration::from_file(&path), Err(ConfigError::Json(_))));
        assert!(matches!(
            Configuration::from_file(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
