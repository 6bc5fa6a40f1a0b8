//! Facet counting (`facet.*`).

use crate::{
    config::{Configuration, FacetType, FacetingConfiguration, NamedFacetConfiguration},
    error::ConfigError,
    query::parameters::{QueryParameterSource, QueryParameters},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Faceting {
    configuration: FacetingConfiguration,
}

impl Faceting {
    /// Reads `search.faceting`, rejecting unknown sort orders and range facets without a range.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, ConfigError> {
        let faceting = configuration.faceting()?;
        if let Some(sort_by) = &faceting.sort_by {
            wire_sort(sort_by, "search.faceting.sortBy")?;
        }
        for facet in &faceting.facets {
            let path = format!("search.faceting.facets.{}", facet.name);
            if let Some(sort_by) = &facet.configuration.sort_by {
                wire_sort(sort_by, &format!("{path}.sortBy"))?;
            }
            let facet_type = facet.configuration.facet_type;
            if matches!(facet_type, FacetType::NumericRange | FacetType::DateRange)
                && facet.configuration.range.is_none()
            {
                return Err(ConfigError::InvalidValue {
                    path: format!("{path}.range"),
                    message: "range facets need start, end and gap".to_string(),
                });
            }
            if facet.configuration.field.is_empty() && facet_type != FacetType::QueryGroup {
                return Err(ConfigError::InvalidValue {
                    path: format!("{path}.field"),
                    message: "missing facet field".to_string(),
                });
            }
        }
        Ok(Self { configuration: faceting })
    }

    pub fn is_enabled(&self) -> bool {
        self.configuration.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.configuration.enabled = enabled;
    }

    pub fn set_minimum_count(&mut self, minimum_count: u64) {
        self.configuration.minimum_count = minimum_count;
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.configuration.limit = limit;
    }

    pub fn configuration(&self) -> &FacetingConfiguration {
        &self.configuration
    }
}

/// Maps a configured sort order onto the two orders Solr knows.
fn wire_sort(sort_by: &str, path: &str) -> Result<&'static str, ConfigError> {
    match sort_by {
        "index" | "lex" | "alpha" => Ok("index"),
        "count" => Ok("count"),
        other => Err(ConfigError::InvalidValue {
            path: path.to_string(),
            message: format!("unknown facet sort {other:?}"),
        }),
    }
}

/// `{!ex=<name>}` when the facet keeps all of its options while one is selected.
fn exclude_prefix(faceting: &FacetingConfiguration, facet: &NamedFacetConfiguration) -> String {
    if faceting.keeps_all_options(facet) {
        format!("{{!ex={}}}", facet.name)
    } else {
        String::new()
    }
}

/// The exact `facet.query` sent for one query group option; Solr echoes it back as the count key.
pub fn query_group_facet_query(
    faceting: &FacetingConfiguration,
    facet: &NamedFacetConfiguration,
    query: &str,
) -> String {
    format!("{}{}:{}", exclude_prefix(faceting, facet), facet.configuration.field, query)
}

impl QueryParameterSource for Faceting {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        let faceting = &self.configuration;
        if !faceting.enabled {
            return parameters;
        }
        parameters.insert("facet".into(), true.into());
        parameters.insert("facet.mincount".into(), faceting.minimum_count.into());
        parameters.insert("facet.limit".into(), faceting.limit.into());
        if let Some(sort) = faceting.sort_by.as_deref().and_then(|sort_by| wire_sort(sort_by, "").ok()) {
            parameters.insert("facet.sort".into(), sort.into());
        }

        let mut fields = Vec::new();
        let mut queries = Vec::new();
        let mut ranges = Vec::new();
        for facet in &faceting.facets {
            let configuration = &facet.configuration;
            let field = &configuration.field;
            match configuration.facet_type {
                FacetType::Options | FacetType::Hierarchy => {
                    fields.push(format!("{}{field}", exclude_prefix(faceting, facet)));
                    if let Some(sort) = configuration.sort_by.as_deref().and_then(|sort_by| wire_sort(sort_by, "").ok()) {
                        parameters.insert(format!("f.{field}.facet.sort"), sort.into());
                    }
                }
                FacetType::QueryGroup => {
                    for (_, option) in &configuration.query_group {
                        queries.push(query_group_facet_query(faceting, facet, &option.query));
                    }
                }
                FacetType::NumericRange | FacetType::DateRange => {
                    let Some(range) = &configuration.range else { continue };
                    ranges.push(format!("{}{field}", exclude_prefix(faceting, facet)));
                    parameters.insert(format!("f.{field}.facet.range.start"), range.start.clone().into());
                    parameters.insert(format!("f.{field}.facet.range.end"), range.end.clone().into());
                    parameters.insert(format!("f.{field}.facet.range.gap"), range.gap.clone().into());
                }
            }
        }
        if !fields.is_empty() {
            parameters.insert("facet.field".into(), fields.into());
        }
        if !queries.is_empty() {
            parameters.insert("facet.query".into(), queries.into());
        }
        if !ranges.is_empty() {
            parameters.insert("facet.range".into(), ranges.into());
        }
        parameters
    }
}
