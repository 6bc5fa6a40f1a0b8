//! Prefix suggestions served from facet counts on a suggest field.

use common::escape::escape_query_term;

use crate::{
    config::Configuration,
    query::{
        filters::Filters,
        parameters::{QueryParameterSource, QueryParameters},
        return_fields::ReturnFields,
    },
};

/// A suggest request: the last typed term becomes a `facet.prefix`, the terms before it the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestQuery {
    keywords: String,
    prefix: String,
    suggest_field: String,
    limit: u64,
    filters: Filters,
    return_fields: ReturnFields,
}

impl SuggestQuery {
    pub fn from_configuration(keywords: &str, configuration: &Configuration) -> Self {
        let keywords = keywords.trim();
        let (head, prefix) = if configuration.bool("suggest.treatMultipleTermsAsSingleTerm", false) {
            ("", keywords)
        } else {
            match keywords.rsplit_once(' ') {
                Some((head, last)) => (head.trim(), last),
                None => ("", keywords),
            }
        };

        let mut filters = Filters::default();
        if let Some(serde_json::Value::Object(configured)) = configuration.value("search.query.filter") {
            for (name, expression) in configured {
                if let Some(expression) = expression.as_str().filter(|expression| !expression.is_empty()) {
                    filters.add(expression, Some(name.as_str()));
                }
            }
        }

        Self {
            keywords: escape_query_term(head),
            prefix: prefix.to_lowercase(),
            suggest_field: configuration.string("suggest.suggestField", "spell"),
            limit: configuration.u64("suggest.numberOfSuggestions", 10),
            filters,
            return_fields: ReturnFields::from_list(
                configuration.string_list("search.query.returnFields", &["*", "score"]),
            ),
        }
    }

    /// The `q` parameter; empty when only a single term was typed.
    pub fn query_string(&self) -> &str {
        &self.keywords
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suggest_field(&self) -> &str {
        &self.suggest_field
    }

    pub fn filters_mut(&mut self) -> &mut Filters {
        &mut self.filters
    }

    pub fn query_parameters(&self) -> QueryParameters {
        let mut parameters = self.return_fields.build();
        parameters.extend(self.filters.build());
        parameters.insert("facet".into(), "on".into());
        parameters.insert("facet.prefix".into(), self.prefix.clone().into());
        parameters.insert("facet.field".into(), self.suggest_field.clone().into());
        parameters.insert("facet.limit".into(), self.limit.into());
        parameters.insert("facet.mincount".into(), 1u64.into());
        if self.keywords.is_empty() {
            parameters.insert("q.alt".into(), "*:*".into());
        }
        parameters
    }
}
