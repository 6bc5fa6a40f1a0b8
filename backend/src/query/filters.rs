//! Filter queries (`fq`).

use crate::query::parameters::{QueryParameterSource, QueryParameters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub expression: String,
    pub name: Option<String>,
}

/// Ordered filter expressions, each optionally tagged with a name.
///
/// Names need not be unique: lookups by name return the first match and removal by name removes
/// every match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    filters: Vec<Filter>,
}

impl Filters {
    /// Appends a filter. Adding the same expression under the same name twice is a no-op.
    pub fn add(&mut self, expression: impl Into<String>, name: Option<&str>) {
        let filter = Filter {
            expression: expression.into(),
            name: name.map(str::to_string),
        };
        if !self.filters.contains(&filter) {
            self.filters.push(filter);
        }
    }

    pub fn remove_by_name(&mut self, name: &str) {
        self.filters.retain(|filter| filter.name.as_deref() != Some(name));
    }

    /// Removes every filter whose expression starts with `prefix`.
    pub fn remove_by_prefix(&mut self, prefix: &str) {
        self.filters.retain(|filter| !filter.expression.starts_with(prefix));
    }

    /// Removes the plain `field:...` filters on `field`.
    pub fn remove_by_field_name(&mut self, field: &str) {
        self.remove_by_prefix(&format!("{field}:"));
    }

    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|filter| filter.name.as_deref() == Some(name))
            .map(|filter| filter.expression.as_str())
    }

    pub fn has_with_name(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    pub fn values(&self) -> Vec<String> {
        self.filters.iter().map(|filter| filter.expression.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl QueryParameterSource for Filters {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.filters.is_empty() {
            parameters.insert("fq".into(), self.values().into());
        }
        parameters
    }
}
