//! Spellcheck suggestions and collations (`spellcheck.*`).

use crate::{
    config::Configuration,
    query::parameters::{QueryParameterSource, QueryParameters},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spellchecking {
    enabled: bool,
    max_collation_tries: u64,
}

impl Default for Spellchecking {
    fn default() -> Self {
        Self { enabled: false, max_collation_tries: 1 }
    }
}

impl Spellchecking {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            enabled: configuration.bool("search.spellchecking", false),
            max_collation_tries: configuration.u64("search.spellchecking.numberOfSuggestionsToTry", 1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl QueryParameterSource for Spellchecking {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.enabled {
            return parameters;
        }
        parameters.insert("spellcheck".into(), true.into());
        parameters.insert("spellcheck.collate".into(), true.into());
        if self.max_collation_tries > 0 {
            parameters.insert("spellcheck.maxCollationTries".into(), self.max_collation_tries.into());
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_collation_parameters_when_enabled() {
        assert!(Spellchecking::default().build().is_empty());

        let configuration = Configuration::new(json!({
            "search": {"spellchecking": {"enabled": "1", "numberOfSuggestionsToTry": 3}}
        }));
        let parameters = Spellchecking::from_configuration(&configuration).build();
        assert_eq!(parameters["spellcheck"].first(), Some("true"));
        assert_eq!(parameters["spellcheck.collate"].first(), Some("true"));
        assert_eq!(parameters["spellcheck.maxCollationTries"].first(), Some("3"));
    }
}
