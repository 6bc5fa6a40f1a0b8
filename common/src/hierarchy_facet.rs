//! Tree model for hierarchical facets.
//!
//! Nodes live in a flat arena owned by the [`HierarchyFacet`]; parent and child links are
//! [`NodeId`] indices into that arena. Nodes are only ever appended, so an id stays valid for the
//! lifetime of the facet.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};


/// Index of a [`Node`] in the arena of its [`HierarchyFacet`]. Only meaningful for the facet that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One option of a hierarchical facet, standing for a single path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Last path segment.
    pub key: String,
    pub label: String,
    /// Full path, `/a/b`. This is what a caller puts back into a request to select the node.
    pub value: String,
    pub count: u64,
    pub selected: bool,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// One hierarchical facet: its flags, the root nodes and the arena holding every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyFacet {
    pub name: String,
    pub field: String,
    pub label: String,
    pub configuration: serde_json::Value,
    pub is_used: bool,
    pub is_available: bool,
    roots: Vec<NodeId>,
    nodes: Vec<Node>,
    #[serde(skip)]
    index: HashMap<String, NodeId>,
}

impl HierarchyFacet {
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        label: impl Into<String>,
        configuration: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            label: label.into(),
            configuration,
            is_used: false,
            is_available: false,
            roots: Vec::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a node and attaches it below the node whose value is `parent_value`.
    ///
    /// When no such node exists the new node becomes a root. Callers must create parents before
    /// their children.
    pub fn create_node(
        &mut self,
        parent_value: Option<&str>,
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        count: u64,
        selected: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent_value.and_then(|parent_value| self.find_id(parent_value));
        let depth = parent.map_or(0, |parent| self.nodes[parent.0].depth + 1);
        let value = value.into();

        self.nodes.push(Node {
            key: key.into(),
            label: label.into(),
            value: value.clone(),
            count,
            selected,
            depth,
            parent,
            children: Vec::new(),
        });
        self.index.insert(value, id);

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    fn find_id(&self, value: &str) -> Option<NodeId> {
        // the index is not serialized, fall back to a scan after deserialization
        self.index
            .get(value)
            .copied()
            .or_else(|| self.nodes.iter().position(|node| node.value == value).map(NodeId))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_by_value(&self, value: &str) -> Option<&Node> {
        self.find_id(value).map(|id| self.node(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.nodes[id.0].parent.map(|parent| self.node(parent))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes[id.0].children.iter().map(|child| self.node(*child))
    }

    pub fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.roots.iter().map(|id| self.node(*id))
    }

    /// Every node in creation order.
    pub fn all_facet_items(&self) -> &[Node] {
        &self.nodes
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facet() -> HierarchyFacet {
        HierarchyFacet::new("category", "category_stringM", "Category", serde_json::Value::Null)
    }

    #[test]
    fn children_attach_to_their_parent() {
        let mut facet = facet();
        let a = facet.create_node(None, "a", "a", "/a", 5, false);
        let b = facet.create_node(Some("/a"), "b", "b", "/a/b", 3, true);

        assert_eq!(facet.root_ids(), &[a]);
        assert_eq!(facet.children(a).map(|n| n.key.as_str()).collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(facet.parent(b).unwrap().key, "a");
        assert_eq!(facet.node(b).depth, 1);
        assert_eq!(facet.all_facet_items().len(), 2);
        assert_eq!(facet.selected_nodes().count(), 1);
    }

    #[test]
    fn same_key_under_different_parents_does_not_collide() {
        let mut facet = facet();
        facet.create_node(None, "a", "a", "/a", 1, false);
        facet.create_node(None, "b", "b", "/b", 1, false);
        facet.create_node(Some("/a"), "x", "x", "/a/x", 1, false);
        facet.create_node(Some("/b"), "x", "x", "/b/x", 1, false);
        let y = facet.create_node(Some("/b/x"), "y", "y", "/b/x/y", 1, false);

        let parent = facet.parent(y).unwrap();
        assert_eq!(parent.value, "/b/x");
        assert_eq!(facet.parent(facet.node(y).parent.unwrap()).unwrap().key, "b");
    }

    #[test]
    fn missing_parent_makes_a_root() {
        let mut facet = facet();
        let orphan = facet.create_node(Some("/missing"), "b", "b", "/missing/b", 2, false);
        assert_eq!(facet.root_ids(), &[orphan]);
        assert_eq!(facet.node(orphan).depth, 0);
    }

    #[test]
    fn lookups_survive_serialization() {
        let mut facet = facet();
        facet.create_node(None, "a", "a", "/a", 5, false);
        let json = serde_json::to_string(&facet).unwrap();
        let mut restored: HierarchyFacet = serde_json::from_str(&json).unwrap();
        let b = restored.create_node(Some("/a"), "b", "b", "/a/b", 1, false);
        assert_eq!(restored.parent(b).unwrap().value, "/a");
        assert!(restored.node_by_value("/a/b").is_some());
    }
}
