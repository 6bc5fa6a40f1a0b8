//! Tree reconstruction for path encoded facets (`<depth>-<path>/`).

use std::{cmp::Ordering, collections::HashSet};

use common::{
    escape::{ESCAPED_SLASH, HierarchyPath},
    hierarchy_facet::HierarchyFacet,
};
use tracing::warn;

use crate::{config::NamedFacetConfiguration, facets::{FacetContext, facet_label}};

struct Candidate {
    path: HierarchyPath,
    encoded: String,
    count: u64,
}

/// Builds the hierarchy tree of one facet.
///
/// The candidates are the response counts merged with the selected paths of the request and
/// their ancestors; selected paths without results get a count of 0. Candidates are ordered so
/// that every parent precedes its children: natural order on the encoded value when the facet is
/// sorted by index, otherwise a stable sort by depth that keeps Solr's order among siblings.
/// Malformed values are logged and skipped.
pub fn parse_hierarchy_facet(context: &FacetContext<'_>, facet: &NamedFacetConfiguration) -> Option<HierarchyFacet> {
    let configuration = &facet.configuration;

    let mut active = HashSet::new();
    let mut selected_paths = Vec::new();
    for value in context.request.active_facet_values(&facet.name) {
        match HierarchyPath::from_request_value(&value) {
            Ok(path) => {
                active.insert(path.encode());
                selected_paths.push(path);
            }
            Err(error) => warn!(facet = %facet.name, %error, "skipping malformed hierarchy selection"),
        }
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut seen = HashSet::new();
    let mut is_available = false;
    if let Some(counts) = context.response.facet_field(&configuration.field) {
        is_available = !counts.is_empty();
        for (value, count) in counts.iter() {
            match HierarchyPath::parse_encoded(value) {
                Ok(path) => push_candidate(&mut candidates, &mut seen, path, count),
                Err(error) => warn!(facet = %facet.name, %error, "skipping malformed hierarchy value"),
            }
        }
    }
    for path in selected_paths {
        let mut ancestors = vec![path];
        while let Some(parent) = ancestors.last().and_then(HierarchyPath::parent) {
            ancestors.push(parent);
        }
        for path in ancestors.into_iter().rev() {
            push_candidate(&mut candidates, &mut seen, path, 0);
        }
    }

    let is_used = !active.is_empty();
    if !context.is_shown(facet, is_available, is_used) {
        return None;
    }

    if configuration.sorts_by_index() {
        candidates.sort_by(|a, b| natural_cmp(&a.encoded, &b.encoded));
    } else {
        candidates.sort_by_key(|candidate| candidate.path.depth());
    }

    let mut hierarchy = HierarchyFacet::new(
        facet.name.clone(),
        configuration.field.clone(),
        facet_label(facet),
        facet.raw.clone(),
    );
    hierarchy.is_available = is_available;
    hierarchy.is_used = is_used;
    for candidate in candidates {
        let path = &candidate.path;
        let value = path.node_value();
        if configuration.is_excluded(path.key())
            || configuration.is_excluded(&value)
            || configuration.is_excluded(&candidate.encoded)
        {
            continue;
        }
        let label = context.label(facet, &path.key().replace(ESCAPED_SLASH, "/"), candidate.count);
        let parent_value = path.parent().map(|parent| parent.node_value());
        hierarchy.create_node(
            parent_value.as_deref(),
            path.key(),
            label,
            value,
            candidate.count,
            active.contains(&candidate.encoded),
        );
    }
    Some(hierarchy)
}

fn push_candidate(candidates: &mut Vec<Candidate>, seen: &mut HashSet<String>, path: HierarchyPath, count: u64) {
    let encoded = path.encode();
    if seen.insert(encoded.clone()) {
        candidates.push(Candidate { path, encoded, count });
    }
}

/// Compares strings treating runs of ASCII digits as numbers, so `2-x` sorts before `10-x`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let (digits_a, rest_a) = split_digits(a);
                let (digits_b, rest_b) = split_digits(b);
                let (trimmed_a, trimmed_b) = (digits_a.trim_start_matches('0'), digits_b.trim_start_matches('0'));
                let ordering = trimmed_a
                    .len()
                    .cmp(&trimmed_b.len())
                    .then_with(|| trimmed_a.cmp(trimmed_b))
                    .then_with(|| digits_a.len().cmp(&digits_b.len()));
                if ordering != Ordering::Equal {
                    return ordering;
                }
                (a, b) = (rest_a, rest_b);
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                (a, b) = (&a[x.len_utf8()..], &b[y.len_utf8()..]);
            }
        }
    }
}

fn split_digits(value: &str) -> (&str, &str) {
    let end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    value.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::test_support::*;
    use common::{hierarchy_facet::Node, search_query::SearchRequest};
    use serde_json::json;

    fn parse(facet_config: serde_json::Value, counts: serde_json::Value, request: &SearchRequest) -> Option<HierarchyFacet> {
        let faceting = faceting(json!({"category": facet_config}));
        let response = response(json!({"facet_fields": {"category": counts}}));
        let context = FacetContext::new(&faceting, request, &response);
        parse_hierarchy_facet(&context, faceting.facet("category").unwrap())
    }

    fn shape(facet: &HierarchyFacet) -> Vec<(&str, &str, u64, bool, Option<&str>)> {
        facet
            .all_facet_items()
            .iter()
            .map(|node: &Node| {
                let parent = node.parent.map(|parent| facet.node(parent).value.as_str());
                (node.key.as_str(), node.value.as_str(), node.count, node.selected, parent)
            })
            .collect()
    }

    #[test]
    fn builds_a_tree_from_counts() {
        let request = SearchRequest::new("hello");
        let facet = parse(
            json!({"field": "category", "type": "hierarchy"}),
            json!(["0-a/", 5, "1-a/b/", 3]),
            &request,
        )
        .unwrap();

        assert_eq!(facet.root_ids().len(), 1);
        let root = facet.roots().next().unwrap();
        assert_eq!((root.key.as_str(), root.value.as_str(), root.count), ("a", "/a", 5));
        let children: Vec<_> = facet.children(facet.root_ids()[0]).collect();
        assert_eq!(children.len(), 1);
        assert_eq!((children[0].key.as_str(), children[0].value.as_str(), children[0].count), ("b", "/a/b", 3));
        assert_eq!(facet.all_facet_items().len(), 2);
        assert!(facet.is_available);
        assert!(!facet.is_used);
    }

    #[test]
    fn selection_without_results_is_materialized() {
        let request = SearchRequest::new("hello").with_facet_value("category", "a/b");
        let facet = parse(json!({"field": "category", "type": "hierarchy"}), json!([]), &request).unwrap();
        assert_eq!(
            shape(&facet),
            vec![("a", "/a", 0, false, None), ("b", "/a/b", 0, true, Some("/a"))]
        );
        assert!(facet.is_used);
        assert!(!facet.is_available);
    }

    #[test]
    fn children_before_parents_in_the_response_still_nest() {
        let request = SearchRequest::new("hello").with_facet_value("category", "1-a/c/");
        let facet = parse(
            json!({"field": "category", "type": "hierarchy"}),
            json!(["2-a/b/x/", 9, "1-a/b/", 7, "0-a/", 5, "1-a/c/", 1, "0-d/", 1]),
            &request,
        )
        .unwrap();
        assert_eq!(
            shape(&facet),
            vec![
                ("a", "/a", 5, false, None),
                ("d", "/d", 1, false, None),
                ("b", "/a/b", 7, false, Some("/a")),
                ("c", "/a/c", 1, true, Some("/a")),
                ("x", "/a/b/x", 9, false, Some("/a/b")),
            ]
        );
        for node in facet.all_facet_items() {
            if let Some(parent) = node.parent {
                assert!(facet.node(parent).children.iter().any(|child| facet.node(*child).value == node.value));
            }
        }
    }

    #[test]
    fn index_sort_uses_natural_order() {
        let request = SearchRequest::new("hello");
        let facet = parse(
            json!({"field": "category", "type": "hierarchy", "sortBy": "index"}),
            json!(["0-item10/", 1, "0-item2/", 1, "1-item2/b/", 1]),
            &request,
        )
        .unwrap();
        let keys: Vec<_> = facet.all_facet_items().iter().map(|node| node.key.as_str()).collect();
        assert_eq!(keys, vec!["item2", "item10", "b"]);
    }

    #[test]
    fn same_key_under_different_parents() {
        let request = SearchRequest::new("hello");
        let facet = parse(
            json!({"field": "category", "type": "hierarchy"}),
            json!(["0-a/", 2, "0-b/", 2, "1-a/x/", 1, "1-b/x/", 1, "2-b/x/y/", 1]),
            &request,
        )
        .unwrap();
        let y = facet.node_by_value("/b/x/y").unwrap();
        assert_eq!(facet.node(y.parent.unwrap()).value, "/b/x");
    }

    #[test]
    fn malformed_and_excluded_values_are_skipped() {
        let request = SearchRequest::new("hello");
        let facet = parse(
            json!({"field": "category", "type": "hierarchy", "excludeValues": "hidden"}),
            json!(["garbage", 3, "0-a/", 2, "1-a/hidden/", 1, "5-a/b/", 1]),
            &request,
        )
        .unwrap();
        assert_eq!(shape(&facet), vec![("a", "/a", 2, false, None)]);
    }

    #[test]
    fn escaped_slashes_stay_inside_a_segment() {
        let request = SearchRequest::new("hello");
        let facet = parse(
            json!({"field": "category", "type": "hierarchy"}),
            json!(["0-a\\/b/", 2, "1-a\\/b/c/", 1]),
            &request,
        )
        .unwrap();
        let root = facet.roots().next().unwrap();
        assert_eq!(root.key, "a\\/b");
        assert_eq!(root.label, "a/b");
        assert_eq!(facet.all_facet_items().len(), 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        /// Prefix-closed path sets with counts, in arbitrary response order.
        fn path_sets() -> impl Strategy<Value = Vec<(Vec<String>, u64)>> {
            prop::collection::vec((prop::collection::vec("[a-c]", 1..4), 0u64..50), 1..8)
                .prop_map(|paths| {
                    let mut closed = BTreeMap::new();
                    for (segments, count) in paths {
                        for depth in 1..=segments.len() {
                            closed.entry(segments[..depth].to_vec()).or_insert(count);
                        }
                    }
                    closed.into_iter().collect::<Vec<_>>()
                })
                .prop_flat_map(|paths| Just(paths).prop_shuffle())
        }

        proptest! {
            #[test]
            fn parents_precede_children_and_no_node_is_lost(paths in path_sets(), by_index in any::<bool>()) {
                let counts: Vec<serde_json::Value> = paths
                    .iter()
                    .flat_map(|(segments, count)| {
                        let encoded = HierarchyPath::from_segments(segments.clone()).unwrap().encode();
                        [json!(encoded), json!(count)]
                    })
                    .collect();
                let sort_by = if by_index { "index" } else { "count" };
                let facet = parse(
                    json!({"field": "category", "type": "hierarchy", "sortBy": sort_by}),
                    serde_json::Value::Array(counts),
                    &SearchRequest::new("hello"),
                )
                .unwrap();

                let items = facet.all_facet_items();
                prop_assert_eq!(items.len(), paths.len());
                for (index, node) in items.iter().enumerate() {
                    match node.parent {
                        Some(parent) => {
                            prop_assert!(parent.0 < index);
                            let parent_prefix = format!("{}/", facet.node(parent).value);
                            prop_assert!(node.value.starts_with(&parent_prefix));
                        }
                        None => prop_assert_eq!(node.value.matches('/').count(), 1),
                    }
                }
                for (segments, count) in &paths {
                    let node = facet.node_by_value(&format!("/{}", segments.join("/")));
                    prop_assert_eq!(node.map(|node| node.count), Some(*count));
                }
            }
        }
    }

    #[test]
    fn natural_ordering() {
        assert_eq!(natural_cmp("0-a/", "1-a/b/"), Ordering::Less);
        assert_eq!(natural_cmp("2-x", "10-x"), Ordering::Less);
        assert_eq!(natural_cmp("a2", "a02"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abd"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }
}
