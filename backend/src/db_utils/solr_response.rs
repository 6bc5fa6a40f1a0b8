//! Typed model of the Solr JSON response (`wt=json`).
//!
//! Solr writes named lists either as flat `[name, value, name, value]` arrays or as objects,
//! depending on `json.nl`. Both forms decode into ordered `(name, value)` pairs.

use std::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer,
    de::{DeserializeOwned, MapAccess, SeqAccess, Visitor},
};
use serde_json::Value;
use tracing::warn;

pub type SolrDocument = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolrResponse {
    pub response_header: ResponseHeader,
    pub response: Option<DocumentList>,
    #[serde(rename = "facet_counts")]
    pub facet_counts: Option<FacetCounts>,
    #[serde(deserialize_with = "named_list")]
    pub highlighting: Vec<(String, Snippets)>,
    pub spellcheck: Option<Spellcheck>,
    #[serde(deserialize_with = "named_list")]
    pub grouped: Vec<(String, GroupedResult)>,
    #[serde(deserialize_with = "named_list")]
    pub expanded: Vec<(String, DocumentList)>,
    pub debug: Option<Value>,
}

impl SolrResponse {
    pub fn documents(&self) -> &[SolrDocument] {
        self.response.as_ref().map(|list| list.docs.as_slice()).unwrap_or_default()
    }

    pub fn num_found(&self) -> u64 {
        match &self.response {
            Some(list) => list.num_found,
            None => self.grouped.iter().map(|(_, group)| group.matches).max().unwrap_or(0),
        }
    }

    /// Snippets of one document, by field.
    pub fn highlighting_for(&self, document_id: &str) -> Option<&Snippets> {
        lookup(&self.highlighting, document_id)
    }

    /// Counts of a `facet.field`, in response order.
    pub fn facet_field(&self, field: &str) -> Option<&FacetValueCounts> {
        self.facet_counts.as_ref().and_then(|counts| lookup(&counts.facet_fields, field))
    }

    pub fn facet_query(&self, query: &str) -> Option<u64> {
        self.facet_counts.as_ref().and_then(|counts| lookup(&counts.facet_queries, query)).copied()
    }

    pub fn facet_range(&self, field: &str) -> Option<&RangeCounts> {
        self.facet_counts.as_ref().and_then(|counts| lookup(&counts.facet_ranges, field))
    }

    /// Collapsed variants of the group with this collapse value.
    pub fn expanded_for(&self, collapse_value: &str) -> Option<&DocumentList> {
        lookup(&self.expanded, collapse_value)
    }
}

/// Ordered `(name, value)` pairs.
pub type NamedList<T> = Vec<(String, T)>;

pub fn lookup<'a, T>(list: &'a [(String, T)], name: &str) -> Option<&'a T> {
    list.iter().find(|(key, _)| key == name).map(|(_, value)| value)
}

/// Highlighted snippets of one document, by field in response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snippets(pub NamedList<Vec<String>>);

impl Snippets {
    /// Snippets of `field`; `None` when Solr returned none for it.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        lookup(&self.0, field).map(Vec::as_slice).filter(|snippets| !snippets.is_empty())
    }
}

impl<'de> Deserialize<'de> for Snippets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        named_list(deserializer).map(Snippets)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseHeader {
    pub status: i64,
    #[serde(rename = "QTime")]
    pub q_time: u64,
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentList {
    pub num_found: u64,
    pub start: u64,
    pub max_score: Option<f64>,
    pub docs: Vec<SolrDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FacetCounts {
    #[serde(deserialize_with = "named_list")]
    pub facet_queries: Vec<(String, u64)>,
    #[serde(deserialize_with = "named_list")]
    pub facet_fields: Vec<(String, FacetValueCounts)>,
    #[serde(deserialize_with = "named_list")]
    pub facet_ranges: Vec<(String, RangeCounts)>,
}

/// Value counts of one facet field in response order. Numeric and boolean values are rendered as
/// strings. Entries that are not a value with a count are logged and skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetValueCounts(pub Vec<(String, u64)>);

impl FacetValueCounts {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(value, count)| (value.as_str(), *count))
    }
}

impl<'de> Deserialize<'de> for FacetValueCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs: Vec<(Value, Value)> = deserializer.deserialize_any(NamedListVisitor(PhantomData))?;
        let counts = pairs
            .into_iter()
            .filter_map(|(value, count)| match (scalar_to_string(value), count.as_u64()) {
                (Ok(value), Some(count)) => Some((value, count)),
                (Ok(value), None) => {
                    warn!(%value, %count, "skipping facet value with an invalid count");
                    None
                }
                (Err(error), _) => {
                    warn!(%error, "skipping facet entry");
                    None
                }
            })
            .collect();
        Ok(FacetValueCounts(counts))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RangeCounts {
    pub counts: FacetValueCounts,
    #[serde(deserialize_with = "scalar")]
    pub start: String,
    #[serde(deserialize_with = "scalar")]
    pub end: String,
    #[serde(deserialize_with = "scalar")]
    pub gap: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupedResult {
    pub matches: u64,
    pub ngroups: Option<u64>,
    /// Field groups.
    pub groups: Vec<FieldGroup>,
    /// The single document list of a query group.
    pub doclist: Option<DocumentList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldGroup {
    pub group_value: Value,
    pub doclist: DocumentList,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Spellcheck {
    #[serde(deserialize_with = "named_list")]
    pub suggestions: Vec<(String, Value)>,
    #[serde(deserialize_with = "named_list")]
    pub collations: Vec<(String, Value)>,
}

/// One spelling collation: the corrected query and, when Solr tried it, its hit count.
#[derive(Debug, Clone, PartialEq)]
pub struct Collation {
    pub query: String,
    pub hits: Option<u64>,
}

impl Spellcheck {
    /// Collations in response order. Plain string collations carry no hit count.
    pub fn collations(&self) -> Vec<Collation> {
        self.collations
            .iter()
            .filter(|(name, _)| name == "collation")
            .filter_map(|(_, collation)| match collation {
                Value::String(query) => Some(Collation { query: query.clone(), hits: None }),
                Value::Object(details) => Some(Collation {
                    query: details.get("collationQuery")?.as_str()?.to_string(),
                    hits: details.get("hits").and_then(Value::as_u64),
                }),
                _ => None,
            })
            .collect()
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a scalar, got {other}")),
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        value => scalar_to_string(value).map_err(serde::de::Error::custom),
    }
}

/// Decodes a named list. An entry whose name or value does not decode is logged and skipped.
fn named_list<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let pairs: Vec<(Value, Value)> = deserializer.deserialize_any(NamedListVisitor(PhantomData))?;
    Ok(pairs
        .into_iter()
        .filter_map(|(name, value)| {
            let name = match scalar_to_string(name) {
                Ok(name) => name,
                Err(error) => {
                    warn!(%error, "skipping named list entry");
                    return None;
                }
            };
            match serde_json::from_value(value) {
                Ok(value) => Some((name, value)),
                Err(error) => {
                    warn!(%name, %error, "skipping undecodable named list entry");
                    None
                }
            }
        })
        .collect())
}

/// Collects a named list from either of its JSON forms without reordering.
struct NamedListVisitor(PhantomData<()>);

impl<'de> Visitor<'de> for NamedListVisitor {
    type Value = Vec<(Value, Value)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flat [name, value, ...] array or an object")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut pairs = Vec::new();
        while let Some(name) = seq.next_element::<Value>()? {
            match seq.next_element::<Value>()? {
                Some(value) => pairs.push((name, value)),
                None => warn!(%name, "skipping named list entry without a value"),
            }
        }
        Ok(pairs)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut pairs = Vec::new();
        while let Some((name, value)) = map.next_entry::<String, Value>()? {
            pairs.push((Value::String(name), value));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_and_map_facet_fields_keep_order() {
        let response: SolrResponse = serde_json::from_value(json!({
            "responseHeader": {"status": 0, "QTime": 3},
            "response": {"numFound": 2, "start": 0, "maxScore": 1.5, "docs": [{"id": "a"}, {"id": "b"}]},
            "facet_counts": {
                "facet_queries": {"created:[NOW-7DAYS TO *]": 4},
                "facet_fields": {
                    "type": ["pages", 10, "news", 3, "events", 1],
                    "year": {"2024": 5, "2023": 2},
                    "flag": [true, 2],
                },
                "facet_ranges": {"price_f": {"counts": ["0.0", 1, "10.0", 4], "start": 0.0, "end": 100.0, "gap": 10.0}},
            },
        }))
        .unwrap();

        assert_eq!(response.response_header.q_time, 3);
        assert_eq!(response.num_found(), 2);
        assert_eq!(response.documents().len(), 2);

        let types: Vec<_> = response.facet_field("type").unwrap().iter().collect();
        assert_eq!(types, vec![("pages", 10), ("news", 3), ("events", 1)]);
        let years: Vec<_> = response.facet_field("year").unwrap().iter().collect();
        assert_eq!(years, vec![("2024", 5), ("2023", 2)]);
        assert_eq!(response.facet_field("flag").unwrap().0, vec![("true".to_string(), 2)]);

        assert_eq!(response.facet_query("created:[NOW-7DAYS TO *]"), Some(4));
        let range = response.facet_range("price_f").unwrap();
        assert_eq!(range.gap, "10.0");
        assert_eq!(range.counts.0.len(), 2);
    }

    #[test]
    fn collations_in_both_forms() {
        let response: SolrResponse = serde_json::from_value(json!({
            "spellcheck": {
                "suggestions": ["helo", {"numFound": 1, "suggestion": ["hello"]}],
                "collations": ["collation", {"collationQuery": "hello world", "hits": 7}, "collation", "hello word"],
            }
        }))
        .unwrap();
        let collations = response.spellcheck.unwrap().collations();
        assert_eq!(
            collations,
            vec![
                Collation { query: "hello world".into(), hits: Some(7) },
                Collation { query: "hello word".into(), hits: None },
            ]
        );
    }

    #[test]
    fn grouped_results_keep_group_order() {
        let response: SolrResponse = serde_json::from_value(json!({
            "grouped": {
                "type": {"matches": 5, "ngroups": 2, "groups": [
                    {"groupValue": "pages", "doclist": {"numFound": 3, "start": 0, "docs": [{"id": "p1"}]}},
                    {"groupValue": null, "doclist": {"numFound": 2, "start": 0, "docs": [{"id": "x1"}]}},
                ]},
                "price:[0 TO 10]": {"matches": 5, "doclist": {"numFound": 1, "start": 0, "docs": [{"id": "c1"}]}},
            },
            "expanded": {"v1": {"numFound": 1, "start": 0, "docs": [{"id": "v1-b"}]}},
        }))
        .unwrap();
        assert_eq!(response.grouped[0].0, "type");
        assert_eq!(response.grouped[0].1.groups.len(), 2);
        assert_eq!(response.grouped[1].1.doclist.as_ref().unwrap().num_found, 1);
        assert_eq!(response.num_found(), 5);
        assert_eq!(response.expanded_for("v1").unwrap().docs[0]["id"], "v1-b");
    }

    #[test]
    fn malformed_facet_entries_are_skipped() {
        let response: SolrResponse = serde_json::from_value(json!({
            "response": {"numFound": 4, "start": 0, "docs": []},
            "facet_counts": {"facet_fields": {
                "type": ["pages", -1, "news", 3, {"nested": 1}, 2, "events", 1.5, "blog", 2],
                "category": ["0-a/", 4, "1-a/b/", 1],
                "author": ["alice", 1, "bob"],
                "broken": "not a list",
            }},
        }))
        .unwrap();
        let types: Vec<_> = response.facet_field("type").unwrap().iter().collect();
        assert_eq!(types, vec![("news", 3), ("blog", 2)]);
        let categories: Vec<_> = response.facet_field("category").unwrap().iter().collect();
        assert_eq!(categories, vec![("0-a/", 4), ("1-a/b/", 1)]);
        let authors: Vec<_> = response.facet_field("author").unwrap().iter().collect();
        assert_eq!(authors, vec![("alice", 1)]);
        assert!(response.facet_field("broken").is_none());
        assert_eq!(response.num_found(), 4);
    }

    #[test]
    fn highlighting_decodes_per_field_objects() {
        let response: SolrResponse = serde_json::from_value(json!({
            "highlighting": {
                "p1": {"content": ["a <em>b</em>", "c"], "title": []},
                "p2": {},
            }
        }))
        .unwrap();
        let snippets = response.highlighting_for("p1").unwrap();
        assert_eq!(snippets.field("content").unwrap(), ["a <em>b</em>", "c"]);
        assert!(snippets.field("title").is_none());
        assert!(response.highlighting_for("p2").unwrap().field("content").is_none());
        assert!(response.highlighting_for("p3").is_none());
    }
}
