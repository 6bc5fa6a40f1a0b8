//! The `fl` parameter.

use crate::query::parameters::{QueryParameterSource, QueryParameters};

/// Ordered, duplicate-free list of field specifiers. Specifiers are compared literally, so pseudo
/// fields such as `isElevated:[elevated]` can be added and removed like plain fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReturnFields {
    fields: Vec<String>,
}

impl ReturnFields {
    pub fn from_list<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut return_fields = Self::default();
        for field in fields {
            return_fields.add(field.as_ref());
        }
        return_fields
    }

    pub fn from_string(fields: &str) -> Self {
        Self::from_list(crate::config::split_list(fields))
    }

    pub fn add(&mut self, field: &str) {
        let field = field.trim();
        if !field.is_empty() && !self.contains(field) {
            self.fields.push(field.to_string());
        }
    }

    pub fn remove(&mut self, field: &str) {
        self.fields.retain(|existing| existing != field);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|existing| existing == field)
    }

    pub fn values(&self) -> &[String] {
        &self.fields
    }
}

impl QueryParameterSource for ReturnFields {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.fields.is_empty() {
            parameters.insert("fl".into(), self.fields.join(",").into());
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_ignores_duplicates() {
        let mut fields = ReturnFields::from_string("*, score, title");
        fields.add("score");
        fields.add("isElevated:[elevated]");
        assert_eq!(fields.build()["fl"].first(), Some("*,score,title,isElevated:[elevated]"));
    }

    #[test]
    fn removes_by_literal_specifier() {
        let mut fields = ReturnFields::from_list(["*", "isElevated:[elevated]"]);
        fields.remove("isElevated");
        assert!(fields.contains("isElevated:[elevated]"));
        fields.remove("isElevated:[elevated]");
        assert_eq!(fields.values(), ["*"]);
    }

    #[test]
    fn empty_list_builds_nothing() {
        assert!(ReturnFields::default().build().is_empty());
    }
}
