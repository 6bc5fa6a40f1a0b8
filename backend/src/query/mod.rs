//! The search request sent to Solr and the builders it is composed of.

mod faceting;
mod fields;
mod filters;
mod grouping;
mod highlighting;
mod parameters;
mod return_fields;
mod spellchecking;
mod suggest;

pub use faceting::{Faceting, query_group_facet_query};
pub use fields::{PhraseFields, PhraseKind, QueryFields, query_fields_from_configuration};
pub use filters::{Filter, Filters};
pub use grouping::Grouping;
pub use highlighting::Highlighting;
pub use parameters::{ParamValue, QueryParameterSource, QueryParameters, to_form_pairs};
pub use return_fields::ReturnFields;
pub use spellchecking::Spellchecking;
pub use suggest::SuggestQuery;

use common::escape::escape_query_term;
use uuid::Uuid;

use crate::{config::Configuration, error::ConfigError};

/// Return field that flags documents pushed to the top by the elevation component.
pub const ELEVATED_MARKER: &str = "isElevated:[elevated]";
/// Marker name used by older schemas.
pub const LEGACY_ELEVATED_MARKER: &str = "[elevated]";

const COLLAPSING_FILTER_NAME: &str = "collapsing";
const ACCESS_FILTER_NAME: &str = "access";
const ACCESS_FILTER_PREFIX: &str = "{!typo3access}";

/// One search request: keywords, paging, sorting and every parameter builder.
///
/// Cloning yields a new query with a fresh [`Query::id`] and the same parameter state.
#[derive(Debug)]
pub struct Query {
    id: Uuid,
    keywords: String,
    keywords_raw: String,
    raw_query_string: bool,
    page: u64,
    results_per_page: u64,
    variant_field: String,
    expand_variants: bool,
    variant_limit: u64,
    parameters: QueryParameters,
    filters: Filters,
    query_fields: QueryFields,
    phrase_fields: PhraseFields,
    bigram_phrase_fields: PhraseFields,
    trigram_phrase_fields: PhraseFields,
    return_fields: ReturnFields,
    highlighting: Highlighting,
    faceting: Faceting,
    grouping: Grouping,
    spellchecking: Spellchecking,
}

impl Clone for Query {
    fn clone(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            keywords: self.keywords.clone(),
            keywords_raw: self.keywords_raw.clone(),
            raw_query_string: self.raw_query_string,
            page: self.page,
            results_per_page: self.results_per_page,
            variant_field: self.variant_field.clone(),
            expand_variants: self.expand_variants,
            variant_limit: self.variant_limit,
            parameters: self.parameters.clone(),
            filters: self.filters.clone(),
            query_fields: self.query_fields.clone(),
            phrase_fields: self.phrase_fields.clone(),
            bigram_phrase_fields: self.bigram_phrase_fields.clone(),
            trigram_phrase_fields: self.trigram_phrase_fields.clone(),
            return_fields: self.return_fields.clone(),
            highlighting: self.highlighting.clone(),
            faceting: self.faceting.clone(),
            grouping: self.grouping.clone(),
            spellchecking: self.spellchecking.clone(),
        }
    }
}

impl Query {
    /// Builds a query for `keywords`, applying every configured default once.
    pub fn from_configuration(keywords: &str, configuration: &Configuration) -> Result<Self, ConfigError> {
        let mut query = Self {
            id: Uuid::new_v4(),
            keywords: String::new(),
            keywords_raw: String::new(),
            raw_query_string: false,
            page: 1,
            results_per_page: configuration.results_per_page(),
            variant_field: configuration.string("search.variants.variantField", "variantId"),
            expand_variants: configuration.bool("search.variants.expand", false),
            variant_limit: configuration.u64("search.variants.limit", 10),
            parameters: QueryParameters::new(),
            filters: Filters::default(),
            query_fields: query_fields_from_configuration(configuration)?,
            phrase_fields: PhraseFields::from_configuration(PhraseKind::Phrase, configuration)?,
            bigram_phrase_fields: PhraseFields::from_configuration(PhraseKind::Bigram, configuration)?,
            trigram_phrase_fields: PhraseFields::from_configuration(PhraseKind::Trigram, configuration)?,
            return_fields: ReturnFields::from_list(
                configuration.string_list("search.query.returnFields", &["*", "score"]),
            ),
            highlighting: Highlighting::from_configuration(configuration),
            faceting: Faceting::from_configuration(configuration)?,
            grouping: Grouping::from_configuration(configuration)?,
            spellchecking: Spellchecking::from_configuration(configuration),
        };
        query.set_keywords(keywords);

        if let Some(filters) =
            configuration.deserialize::<serde_json::Map<String, serde_json::Value>>("search.query.filter")?
        {
            for (name, expression) in filters {
                if let Some(expression) = expression.as_str().filter(|expression| !expression.is_empty()) {
                    query.filters.add(expression, Some(name.as_str()));
                }
            }
        }
        for (key, parameter) in [
            ("search.query.minimumMatch", "mm"),
            ("search.query.boostFunction", "bf"),
            ("search.query.boostQuery", "bq"),
            ("search.query.tieParameter", "tie"),
        ] {
            if let Some(value) = configuration.optional_string(key) {
                query.add_parameter(parameter, value);
            }
        }
        query.set_query_type(configuration.optional_string("search.query.queryType").as_deref());
        if configuration.bool("search.query.allowEmptyQuery", false) {
            query.add_parameter("q.alt", "*:*");
        }
        if let Some(sorting) = configuration.optional_string("search.sorting.defaultOrder") {
            query.set_sorting(&sorting)?;
        }
        Ok(query)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Sets the user keywords; the query string is their escaped form.
    pub fn set_keywords(&mut self, keywords: &str) {
        self.keywords_raw = keywords.to_string();
        self.keywords = escape_query_term(keywords.trim());
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn keywords_raw(&self) -> &str {
        &self.keywords_raw
    }

    /// Sends the raw keywords as `q` without escaping, for callers that build Lucene syntax.
    pub fn use_raw_query_string(&mut self, raw: bool) {
        self.raw_query_string = raw;
    }

    /// The `q` parameter.
    pub fn query_string(&self) -> &str {
        if self.raw_query_string {
            &self.keywords_raw
        } else {
            &self.keywords
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn set_page(&mut self, page: u64) {
        self.page = page;
    }

    pub fn results_per_page(&self) -> u64 {
        self.results_per_page
    }

    pub fn set_results_per_page(&mut self, results_per_page: u64) {
        self.results_per_page = results_per_page;
    }

    /// Rows per request: the group count when grouping, otherwise the page size.
    pub fn rows(&self) -> u64 {
        if self.grouping.is_enabled() {
            self.grouping.number_of_groups()
        } else {
            self.results_per_page
        }
    }

    /// Offset of the first row of the current 1-based page. Saturates instead of overflowing.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.rows())
    }

    /// Sets `sort` from a comma separated `<field> <asc|desc>` list.
    ///
    /// A leading `relevance` entry, or an empty list, removes the parameter so Solr ranks by score.
    pub fn set_sorting(&mut self, sorting: &str) -> Result<(), ConfigError> {
        let mut criteria = Vec::new();
        for criterion in sorting.split(',').map(str::trim).filter(|criterion| !criterion.is_empty()) {
            let mut parts = criterion.split_whitespace();
            let field = parts.next().unwrap_or_default();
            if criteria.is_empty() && field == "relevance" {
                self.remove_parameter("sort");
                return Ok(());
            }
            let direction = parts.next().unwrap_or_default().to_ascii_lowercase();
            if !matches!(direction.as_str(), "asc" | "desc") || parts.next().is_some() {
                return Err(ConfigError::InvalidSortDirection {
                    sorting: sorting.to_string(),
                    direction,
                });
            }
            criteria.push(format!("{field} {direction}"));
        }
        if criteria.is_empty() {
            self.remove_parameter("sort");
        } else {
            self.add_parameter("sort", criteria.join(","));
        }
        Ok(())
    }

    pub fn sorting(&self) -> Option<&str> {
        self.parameter("sort").and_then(ParamValue::first)
    }

    pub fn set_query_type(&mut self, query_type: Option<&str>) {
        match query_type {
            Some(query_type) => self.add_parameter("qt", query_type),
            None => self.remove_parameter("qt"),
        }
    }

    /// Sets an ad-hoc wire parameter, replacing any earlier value for the key.
    pub fn add_parameter(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.parameters.insert(key.to_string(), value.into());
    }

    pub fn remove_parameter(&mut self, key: &str) {
        self.parameters.remove(key);
    }

    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(key)
    }

    pub fn set_debug_mode(&mut self, debug: bool) {
        if debug {
            self.add_parameter("debugQuery", true);
            self.add_parameter("echoParams", "all");
        } else {
            self.remove_parameter("debugQuery");
            self.remove_parameter("echoParams");
        }
    }

    pub fn set_omit_header(&mut self, omit: bool) {
        if omit {
            self.add_parameter("omitHeader", true);
        } else {
            self.remove_parameter("omitHeader");
        }
    }

    /// Collapses document variants on the configured variant field.
    pub fn set_collapsing(&mut self, enabled: bool) {
        if enabled {
            self.filters.add(
                format!("{{!collapse field={}}}", self.variant_field),
                Some(COLLAPSING_FILTER_NAME),
            );
            if self.expand_variants {
                self.add_parameter("expand", true);
                self.add_parameter("expand.rows", self.variant_limit);
            }
        } else {
            self.filters.remove_by_name(COLLAPSING_FILTER_NAME);
            self.remove_parameter("expand");
            self.remove_parameter("expand.rows");
        }
    }

    pub fn is_collapsing(&self) -> bool {
        self.filters.has_with_name(COLLAPSING_FILTER_NAME)
    }

    pub fn variant_field(&self) -> &str {
        &self.variant_field
    }

    pub fn set_query_elevation(&mut self, enabled: bool, force_elevation: bool, mark_elevated: bool) {
        if enabled {
            self.add_parameter("enableElevation", true);
            if force_elevation {
                self.add_parameter("forceElevation", true);
            } else {
                self.remove_parameter("forceElevation");
            }
            if mark_elevated {
                self.return_fields.add(ELEVATED_MARKER);
            }
        } else {
            self.add_parameter("enableElevation", false);
            self.remove_parameter("forceElevation");
            self.return_fields.remove(ELEVATED_MARKER);
            self.return_fields.remove(LEGACY_ELEVATED_MARKER);
        }
    }

    /// Restricts results to the given frontend user groups, replacing any earlier restriction.
    /// Group `0` (public) is always included.
    pub fn set_user_access_groups(&mut self, groups: &[i64]) {
        let mut unique: Vec<i64> = Vec::with_capacity(groups.len() + 1);
        for group in groups.iter().copied().chain(std::iter::once(0)) {
            if !unique.contains(&group) {
                unique.push(group);
            }
        }
        let groups = unique.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        self.filters.remove_by_prefix(ACCESS_FILTER_PREFIX);
        self.filters.add(format!("{ACCESS_FILTER_PREFIX}{groups}"), Some(ACCESS_FILTER_NAME));
    }

    pub fn set_highlighting(&mut self, enabled: bool, fragment_size: Option<u64>) {
        self.highlighting.set_enabled(enabled);
        if let Some(fragment_size) = fragment_size {
            self.highlighting.set_fragment_size(fragment_size);
        }
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut Filters {
        &mut self.filters
    }

    pub fn query_fields(&self) -> &QueryFields {
        &self.query_fields
    }

    pub fn query_fields_mut(&mut self) -> &mut QueryFields {
        &mut self.query_fields
    }

    pub fn phrase_fields(&self, kind: PhraseKind) -> &PhraseFields {
        match kind {
            PhraseKind::Phrase => &self.phrase_fields,
            PhraseKind::Bigram => &self.bigram_phrase_fields,
            PhraseKind::Trigram => &self.trigram_phrase_fields,
        }
    }

    pub fn phrase_fields_mut(&mut self, kind: PhraseKind) -> &mut PhraseFields {
        match kind {
            PhraseKind::Phrase => &mut self.phrase_fields,
            PhraseKind::Bigram => &mut self.bigram_phrase_fields,
            PhraseKind::Trigram => &mut self.trigram_phrase_fields,
        }
    }

    pub fn return_fields(&self) -> &ReturnFields {
        &self.return_fields
    }

    pub fn return_fields_mut(&mut self) -> &mut ReturnFields {
        &mut self.return_fields
    }

    pub fn highlighting(&self) -> &Highlighting {
        &self.highlighting
    }

    pub fn faceting(&self) -> &Faceting {
        &self.faceting
    }

    pub fn faceting_mut(&mut self) -> &mut Faceting {
        &mut self.faceting
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    pub fn grouping_mut(&mut self) -> &mut Grouping {
        &mut self.grouping
    }

    pub fn spellchecking(&self) -> &Spellchecking {
        &self.spellchecking
    }

    pub fn spellchecking_mut(&mut self) -> &mut Spellchecking {
        &mut self.spellchecking
    }

    /// Every wire parameter except `q`, `start` and `rows`.
    ///
    /// Merged in a fixed order, later sources overwriting earlier ones per key: return fields,
    /// filters, ad-hoc parameters, query fields, the enabled phrase fields, highlighting,
    /// faceting, grouping and spellchecking.
    pub fn query_parameters(&self) -> QueryParameters {
        let mut parameters = self.return_fields.build();
        parameters.extend(self.filters.build());
        parameters.extend(self.parameters.clone());
        parameters.extend(self.query_fields.build());
        for phrase_fields in [&self.phrase_fields, &self.bigram_phrase_fields, &self.trigram_phrase_fields] {
            parameters.extend(phrase_fields.build());
        }
        parameters.extend(self.highlighting.build());
        parameters.extend(self.faceting.build());
        parameters.extend(self.grouping.build());
        parameters.extend(self.spellchecking.build());
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(keywords: &str) -> Query {
        Query::from_configuration(keywords, &Configuration::default()).unwrap()
    }

    #[test]
    fn defaults_from_empty_configuration() {
        let query = query("hello");
        assert_eq!(query.query_string(), "hello");
        assert_eq!(query.page(), 1);
        assert_eq!(query.rows(), 10);
        let parameters = query.query_parameters();
        assert_eq!(parameters["fl"].first(), Some("*,score"));
        assert!(parameters["qf"].first().unwrap().starts_with("content^40.0 title^5.0"));
        for key in ["fq", "pf", "pf2", "pf3", "hl", "facet", "group", "spellcheck", "sort"] {
            assert!(!parameters.contains_key(key), "unexpected {key}");
        }
    }

    #[test]
    fn keywords_are_escaped_unless_raw() {
        let mut query = query("title:(foo)");
        assert_eq!(query.query_string(), "title\\:\\(foo\\)");
        query.use_raw_query_string(true);
        assert_eq!(query.query_string(), "title:(foo)");
    }

    #[test]
    fn clone_gets_a_fresh_identity() {
        let mut query = query("hello");
        query.filters_mut().add("type:pages", None);
        let copy = query.clone();
        assert_ne!(copy.id(), query.id());
        assert_eq!(copy.query_parameters(), query.query_parameters());
        assert_eq!(copy.keywords(), query.keywords());
    }

    #[test]
    fn sorting_validates_direction_and_drops_relevance() {
        let mut query = query("hello");
        query.set_sorting("title ASC, created desc").unwrap();
        assert_eq!(query.sorting(), Some("title asc,created desc"));

        query.set_sorting("relevance desc").unwrap();
        assert_eq!(query.sorting(), None);
        assert!(!query.query_parameters().contains_key("sort"));

        assert!(matches!(
            query.set_sorting("title upwards"),
            Err(ConfigError::InvalidSortDirection { direction, .. }) if direction == "upwards"
        ));
        assert!(query.set_sorting("title").is_err());
    }

    #[test]
    fn collapsing_toggle_is_reversible() {
        let configuration = Configuration::new(json!({
            "search": {"variants": {"enabled": 1, "variantField": "variantId", "expand": 1, "limit": 5}}
        }));
        let mut query = Query::from_configuration("hello", &configuration).unwrap();
        let before = query.query_parameters();

        query.set_collapsing(true);
        assert!(query.is_collapsing());
        let parameters = query.query_parameters();
        assert_eq!(parameters["fq"].values(), ["{!collapse field=variantId}"]);
        assert_eq!(parameters["expand"].first(), Some("true"));
        assert_eq!(parameters["expand.rows"].first(), Some("5"));

        query.set_collapsing(false);
        assert!(!query.is_collapsing());
        assert_eq!(query.query_parameters(), before);
    }

    #[test]
    fn elevation_marks_and_unmarks_results() {
        let mut query = query("hello");
        query.return_fields_mut().add(LEGACY_ELEVATED_MARKER);

        query.set_query_elevation(true, true, true);
        query.set_query_elevation(true, true, true);
        let markers = query
            .return_fields()
            .values()
            .iter()
            .filter(|field| field.as_str() == ELEVATED_MARKER)
            .count();
        assert_eq!(markers, 1);
        let parameters = query.query_parameters();
        assert_eq!(parameters["enableElevation"].first(), Some("true"));
        assert_eq!(parameters["forceElevation"].first(), Some("true"));

        query.set_query_elevation(false, false, false);
        assert!(!query.return_fields().contains(ELEVATED_MARKER));
        assert!(!query.return_fields().contains(LEGACY_ELEVATED_MARKER));
        let parameters = query.query_parameters();
        assert_eq!(parameters["enableElevation"].first(), Some("false"));
        assert!(!parameters.contains_key("forceElevation"));
    }

    #[test]
    fn access_groups_replace_the_previous_restriction() {
        let mut query = query("hello");
        query.set_user_access_groups(&[1, 2, 1]);
        query.set_user_access_groups(&[-2, 3]);
        assert_eq!(query.filters().values(), vec!["{!typo3access}-2,3,0"]);
        assert_eq!(query.filters().get_by_name("access"), Some("{!typo3access}-2,3,0"));
    }

    #[test]
    fn grouping_switches_rows_to_group_count() {
        let configuration = Configuration::new(json!({
            "search": {
                "results": {"resultsPerPage": 20},
                "grouping": {"enabled": 1, "numberOfGroups": 4},
            }
        }));
        let mut query = Query::from_configuration("hello", &configuration).unwrap();
        assert_eq!(query.rows(), 4);
        query.set_page(3);
        assert_eq!(query.offset(), 8);
        query.grouping_mut().set_enabled(false);
        assert_eq!(query.rows(), 20);
    }

    #[test]
    fn offset_saturates_on_huge_pages() {
        let mut query = query("hello");
        query.set_page(u64::MAX);
        assert_eq!(query.offset(), u64::MAX);
        query.set_page(0);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn later_builders_overwrite_ad_hoc_parameters() {
        let mut query = query("hello");
        query.add_parameter("qf", "custom");
        query.add_parameter("fl", "id");
        let parameters = query.query_parameters();
        assert!(parameters["qf"].first().unwrap().starts_with("content^40.0"));
        assert_eq!(parameters["fl"].first(), Some("id"));
    }

    #[test]
    fn configured_extras_are_applied_once() {
        let configuration = Configuration::new(json!({
            "search": {
                "query": {
                    "filter": {"pages": "type:pages", "empty": ""},
                    "minimumMatch": "2<-25%",
                    "tieParameter": 0.1,
                    "allowEmptyQuery": 1,
                    "queryType": "edismax",
                },
                "sorting": {"defaultOrder": "created desc"},
            }
        }));
        let query = Query::from_configuration("", &configuration).unwrap();
        let parameters = query.query_parameters();
        assert_eq!(parameters["fq"].values(), ["type:pages"]);
        assert_eq!(query.filters().get_by_name("pages"), Some("type:pages"));
        assert_eq!(parameters["mm"].first(), Some("2<-25%"));
        assert_eq!(parameters["tie"].first(), Some("0.1"));
        assert_eq!(parameters["q.alt"].first(), Some("*:*"));
        assert_eq!(parameters["sort"].first(), Some("created desc"));
        assert_eq!(parameters["qt"].first(), Some("edismax"));

        let mut query = query;
        query.set_query_type(None);
        assert!(!query.query_parameters().contains_key("qt"));
    }

    #[test]
    fn debug_mode_toggles() {
        let mut query = query("hello");
        query.set_debug_mode(true);
        query.set_omit_header(true);
        let parameters = query.query_parameters();
        assert_eq!(parameters["debugQuery"].first(), Some("true"));
        assert_eq!(parameters["echoParams"].first(), Some("all"));
        assert_eq!(parameters["omitHeader"].first(), Some("true"));
        query.set_debug_mode(false);
        assert!(!query.query_parameters().contains_key("debugQuery"));
    }
}
