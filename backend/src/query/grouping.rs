//! Result grouping (`group.*`).

use serde::Deserialize;

use crate::{
    config::Configuration,
    error::ConfigError,
    query::parameters::{QueryParameterSource, QueryParameters},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grouping {
    enabled: bool,
    fields: Vec<String>,
    queries: Vec<String>,
    sortings: Vec<String>,
    number_of_groups: u64,
    results_per_group: u64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct GroupConfiguration {
    field: Option<String>,
    queries: Vec<String>,
    sort_by: Option<String>,
}

impl Grouping {
    /// Reads `search.grouping` and its `groups.<name>` blocks in declaration order.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, ConfigError> {
        let mut grouping = Self {
            enabled: configuration.bool("search.grouping", false),
            number_of_groups: configuration.u64("search.grouping.numberOfGroups", 5),
            results_per_group: configuration.u64("search.grouping.numberOfResultsPerGroup", 1),
            ..Default::default()
        };
        let groups: Option<serde_json::Map<String, serde_json::Value>> =
            configuration.deserialize("search.grouping.groups")?;
        for (name, group) in groups.unwrap_or_default() {
            let group: GroupConfiguration =
                serde_json::from_value(group).map_err(|source| ConfigError::InvalidValue {
                    path: format!("search.grouping.groups.{name}"),
                    message: source.to_string(),
                })?;
            if let Some(field) = group.field {
                grouping.add_field(&field);
            }
            for query in group.queries {
                grouping.add_query(&query);
            }
            if let Some(sort_by) = group.sort_by {
                grouping.add_sorting(&sort_by);
            }
        }
        Ok(grouping)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn number_of_groups(&self) -> u64 {
        self.number_of_groups
    }

    pub fn add_field(&mut self, field: &str) {
        push_unique(&mut self.fields, field);
    }

    pub fn add_query(&mut self, query: &str) {
        push_unique(&mut self.queries, query);
    }

    pub fn add_sorting(&mut self, sorting: &str) {
        push_unique(&mut self.sortings, sorting);
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}

impl QueryParameterSource for Grouping {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.enabled {
            return parameters;
        }
        parameters.insert("group".into(), true.into());
        parameters.insert("group.format".into(), "grouped".into());
        parameters.insert("group.ngroups".into(), true.into());
        if self.results_per_group > 0 {
            parameters.insert("group.limit".into(), self.results_per_group.into());
        }
        if !self.fields.is_empty() {
            parameters.insert("group.field".into(), self.fields.clone().into());
        }
        if !self.queries.is_empty() {
            parameters.insert("group.query".into(), self.queries.clone().into());
        }
        if !self.sortings.is_empty() {
            parameters.insert("group.sort".into(), self.sortings.clone().into());
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disabled_builds_nothing() {
        assert!(Grouping::default().build().is_empty());
    }

    #[test]
    fn groups_from_configuration() {
        let configuration = Configuration::new(json!({
            "search": {"grouping": {
                "enabled": 1,
                "numberOfGroups": 3,
                "numberOfResultsPerGroup": 2,
                "groups": {
                    "typeGroup": {"field": "type"},
                    "priceGroup": {"queries": ["price:[0 TO 10]", "price:[10 TO *]"], "sortBy": "price asc"},
                },
            }}
        }));
        let grouping = Grouping::from_configuration(&configuration).unwrap();
        assert_eq!(grouping.number_of_groups(), 3);

        let parameters = grouping.build();
        assert_eq!(parameters["group"].first(), Some("true"));
        assert_eq!(parameters["group.format"].first(), Some("grouped"));
        assert_eq!(parameters["group.limit"].first(), Some("2"));
        assert_eq!(parameters["group.field"].values(), ["type"]);
        assert_eq!(parameters["group.query"].values(), ["price:[0 TO 10]", "price:[10 TO *]"]);
        assert_eq!(parameters["group.sort"].values(), ["price asc"]);
    }
}
