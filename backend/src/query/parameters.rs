//! Wire parameter maps shared by all query builders.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single or repeated wire parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Single(value) => std::slice::from_ref(value),
            ParamValue::Multi(values) => values,
        }
    }

    /// The value of a single parameter, or the first of a repeated one.
    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Single(if value { "true" } else { "false" }.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

/// Wire parameters keyed by name. Merging is last-writer-wins per key.
pub type QueryParameters = BTreeMap<String, ParamValue>;

/// Anything that contributes wire parameters to a request.
///
/// Implementations return only the parameters of their own concern and an empty map when the
/// concern is disabled.
pub trait QueryParameterSource {
    fn build(&self) -> QueryParameters;
}

/// Flattens a parameter map into form pairs, repeating keys of multi-valued parameters.
pub fn to_form_pairs(parameters: &QueryParameters) -> Vec<(String, String)> {
    parameters
        .iter()
        .flat_map(|(key, value)| value.values().iter().map(move |v| (key.clone(), v.clone())))
        .collect()
}
