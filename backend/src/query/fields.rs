//! Boosted field lists: query fields (`qf`) and the phrase variants (`pf`, `pf2`, `pf3`).

use crate::{
    config::{Configuration, split_list},
    error::ConfigError,
    query::parameters::{QueryParameterSource, QueryParameters},
};

const DEFAULT_QUERY_FIELDS: &str = "content^40.0, title^5.0, keywords^2.0, tagsH1^5.0, \
    tagsH2H3^3.0, tagsH4H5H6^2.0, tagsInline^1.0, description^4.0, abstract^1.0, subtitle^1.0, \
    navtitle^1.0, author^1.0";

const DEFAULT_PHRASE_FIELDS: &str = "content^10.0, title^10.0, tagsH1^10.0, tagsH2H3^10.0, \
    tagsH4H5H6^10.0, tagsInline^10.0, description^10.0, abstract^10.0, subtitle^10.0";

/// An ordered field → boost mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryFields {
    fields: Vec<(String, f64)>,
}

impl QueryFields {
    /// Parses `field^boost, field2, ...`. A missing boost is `1.0`.
    pub fn from_string(value: &str) -> Result<Self, ConfigError> {
        let mut fields = Self::default();
        for entry in split_list(value) {
            let (name, boost) = match entry.split_once('^') {
                Some((name, boost)) => {
                    let boost = boost.trim().parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                        path: value.to_string(),
                        message: format!("invalid boost {boost:?} for field {name:?}"),
                    })?;
                    (name.trim(), boost)
                }
                None => (entry.as_str(), 1.0),
            };
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    path: value.to_string(),
                    message: "empty field name".to_string(),
                });
            }
            fields.set(name, boost);
        }
        Ok(fields)
    }

    /// Adds a field or replaces the boost of an existing one, keeping its position.
    pub fn set(&mut self, field: &str, boost: f64) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = boost,
            None => self.fields.push((field.to_string(), boost)),
        }
    }

    pub fn remove(&mut self, field: &str) {
        self.fields.retain(|(name, _)| name != field);
    }

    pub fn boost(&self, field: &str) -> Option<f64> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, boost)| *boost)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Space separated `field^boost` list; a boost of exactly `1.0` is omitted.
    pub fn to_boost_string(&self) -> String {
        self.fields
            .iter()
            .map(|(name, boost)| {
                if *boost == 1.0 {
                    name.clone()
                } else {
                    format!("{name}^{}", format_boost(*boost))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// At least one decimal, more only when the boost needs them: `5.0`, `2.5`, `0.25`.
fn format_boost(boost: f64) -> String {
    let one_decimal = format!("{boost:.1}");
    if one_decimal.parse::<f64>().is_ok_and(|rounded| rounded == boost) {
        one_decimal
    } else {
        boost.to_string()
    }
}

impl QueryParameterSource for QueryFields {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.is_empty() {
            parameters.insert("qf".into(), self.to_boost_string().into());
        }
        parameters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseKind {
    Phrase,
    Bigram,
    Trigram,
}

impl PhraseKind {
    fn fields_parameter(self) -> &'static str {
        match self {
            PhraseKind::Phrase => "pf",
            PhraseKind::Bigram => "pf2",
            PhraseKind::Trigram => "pf3",
        }
    }

    fn slop_parameter(self) -> &'static str {
        match self {
            PhraseKind::Phrase => "ps",
            PhraseKind::Bigram => "ps2",
            PhraseKind::Trigram => "ps3",
        }
    }

    fn configuration_key(self) -> &'static str {
        match self {
            PhraseKind::Phrase => "search.query.phrase",
            PhraseKind::Bigram => "search.query.bigramPhrase",
            PhraseKind::Trigram => "search.query.trigramPhrase",
        }
    }

    /// Flat field list key, read when the switch block carries no `fields`.
    fn fields_key(self) -> &'static str {
        match self {
            PhraseKind::Phrase => "search.query.phraseFields",
            PhraseKind::Bigram => "search.query.bigramPhraseFields",
            PhraseKind::Trigram => "search.query.trigramPhraseFields",
        }
    }
}

/// Phrase boosting fields for one of `pf`, `pf2` or `pf3`, with its slop.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseFields {
    kind: PhraseKind,
    enabled: bool,
    fields: QueryFields,
    slop: Option<u64>,
}

impl PhraseFields {
    pub fn new(kind: PhraseKind, enabled: bool, fields: QueryFields) -> Self {
        Self { kind, enabled, fields, slop: None }
    }

    /// Reads `search.query.<phrase|bigramPhrase|trigramPhrase>` with its `fields` and `slop`.
    /// The fields may also be given flat as `search.query.phraseFields` and so on.
    pub fn from_configuration(kind: PhraseKind, configuration: &Configuration) -> Result<Self, ConfigError> {
        let key = kind.configuration_key();
        let fields = configuration
            .optional_string(&format!("{key}.fields"))
            .or_else(|| configuration.optional_string(kind.fields_key()))
            .unwrap_or_else(|| DEFAULT_PHRASE_FIELDS.to_string());
        let mut phrase_fields = Self::new(kind, configuration.bool(key, false), QueryFields::from_string(&fields)?);
        phrase_fields.slop = configuration
            .optional_string(&format!("{key}.slop"))
            .and_then(|slop| slop.parse().ok());
        Ok(phrase_fields)
    }

    pub fn kind(&self) -> PhraseKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_slop(&mut self, slop: Option<u64>) {
        self.slop = slop;
    }

    pub fn fields(&self) -> &QueryFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut QueryFields {
        &mut self.fields
    }
}

impl QueryParameterSource for PhraseFields {
    fn build(&self) -> QueryParameters {
        let mut parameters = QueryParameters::new();
        if !self.enabled || self.fields.is_empty() {
            return parameters;
        }
        parameters.insert(self.kind.fields_parameter().into(), self.fields.to_boost_string().into());
        if let Some(slop) = self.slop {
            parameters.insert(self.kind.slop_parameter().into(), slop.into());
        }
        parameters
    }
}

/// Reads `search.query.fields`, falling back to the default field list.
pub fn query_fields_from_configuration(configuration: &Configuration) -> Result<QueryFields, ConfigError> {
    QueryFields::from_string(&configuration.string("search.query.fields", DEFAULT_QUERY_FIELDS))
}
