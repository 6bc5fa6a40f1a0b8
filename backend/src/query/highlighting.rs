//! Result highlighting (`hl.*`).

use crate::{
    config::{Configuration, split_list},
    query::parameters::{QueryParameterSource, QueryParameters},
};

const DEFAULT_WRAP: &str = "<span class=\"results-highlight\">|</span>";

/// Below this fragment size the fast vector highlighter rejects the request.
const FAST_VECTOR_MIN_FRAGMENT_SIZE: u64 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighting {
    enabled: bool,
    fragment_size: u64,
    fields: String,
    prefix: String,
    postfix: String,
}

impl Default for Highlighting {
    fn default() -> Self {
        let (prefix, postfix) = split_wrap(DEFAULT_WRAP);
        Self {
            enabled: false,
            fragment_size: 200,
            fields: "content".to_string(),
            prefix,
            postfix,
        }
    }
}

impl Highlighting {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        let (prefix, postfix) = split_wrap(&configuration.string("search.highlighting.wrap", DEFAULT_WRAP));
        Self {
            enabled: configuration.bool("search.highlighting", false),
            fragment_size: configuration.u64("search.highlighting.fragmentSize", 200),
            fields: configuration.string("search.highlighting.highlightFields", "content"),
            prefix,
            postfix,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_fragment_size(&mut self, fragment_size: u64) {
        self.fragment_size = fragment_size;
    }

    pub fn set_fields(&mut self, fields: impl Into<String>) {
        self.fields = fields.into();
    }

    /// The highlighted fields, in configured order.
    pub fn fields(&self) -> Vec<String> {
        split_list(&self.fields)
    }

    /// Marker placed before a highlighted term.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Marker placed after a highlighted term.
    pub fn postfix(&self) -> &str {
        &self.postfix
    }
}

/// Splits a `before|after` wrap. Without a `|` there is no marker at all.
fn split_wrap(wrap: &str) -> (String, String) {
    match wrap.split_once('|') {
        Some((prefix, postfix)) => (prefix.to_string(), postfix.to_string()),
        None => (String::new(), String::new()),
    }
}

impl QueryParameterSource for Highlighting {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.enabled {
            return parameters;
        }
        parameters.insert("hl".into(), true.into());
        parameters.insert("hl.fragsize".into(), self.fragment_size.into());
        if !self.fields.is_empty() {
            parameters.insert("hl.fl".into(), self.fields.clone().into());
        }
        if self.fragment_size >= FAST_VECTOR_MIN_FRAGMENT_SIZE {
            parameters.insert("hl.useFastVectorHighlighter".into(), true.into());
            parameters.insert("hl.tag.pre".into(), self.prefix.clone().into());
            parameters.insert("hl.tag.post".into(), self.postfix.clone().into());
        }
        if !self.prefix.is_empty() && !self.postfix.is_empty() {
            parameters.insert("hl.simple.pre".into(), self.prefix.clone().into());
            parameters.insert("hl.simple.post".into(), self.postfix.clone().into());
        }
        parameters
    }
}
