//! Arena-backed chooser tree: root → library → alias → unit.
//!
//! Nodes are only ever appended; a tree is dropped as a whole. Parent links
//! are arena indices.

use std::cmp::Ordering;

use serde::Serialize;

use crate::LibId;
use crate::kicad::symbol_lib::SymbolEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Library,
    Alias,
    Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Library {
        status: LoadStatus,
    },
    Alias {
        lib_id: LibId,
        /// Lowercase keywords, description and footprint filters
        search_text: String,
        is_root: bool,
        power: bool,
        unit_count: u32,
    },
    Unit {
        lib_id: LibId,
        unit: u32,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub description: String,
    /// Lowercase name compared against search terms
    pub match_name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub score: u32,
    /// Position among siblings at insertion time; breaks score ties.
    pub intrinsic_rank: usize,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Root => NodeKind::Root,
            NodeData::Library { .. } => NodeKind::Library,
            NodeData::Alias { .. } => NodeKind::Alias,
            NodeData::Unit { .. } => NodeKind::Unit,
        }
    }

    pub fn lib_id(&self) -> Option<&LibId> {
        match &self.data {
            NodeData::Alias { lib_id, .. } | NodeData::Unit { lib_id, .. } => Some(lib_id),
            _ => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.score > 0
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTree {
    nodes: Vec<Node>,
}

impl Default for SymbolTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                description: String::new(),
                match_name: String::new(),
                parent: None,
                children: Vec::new(),
                score: 1,
                intrinsic_rank: 0,
                data: NodeData::Root,
            }],
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> &Node {
        self.node(NodeId::ROOT)
    }

    pub fn libraries(&self) -> &[NodeId] {
        &self.root().children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// All node ids in arena (insertion) order, root first.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    fn push(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        let siblings = &mut self.nodes[parent.0].children;
        node.parent = Some(parent);
        node.intrinsic_rank = siblings.len();
        siblings.push(id);
        self.nodes.push(node);
        id
    }

    pub fn add_library(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        status: LoadStatus,
    ) -> NodeId {
        let name = name.into();
        self.push(
            NodeId::ROOT,
            Node {
                match_name: name.to_lowercase(),
                name,
                description: description.into(),
                parent: None,
                children: Vec::new(),
                score: 0,
                intrinsic_rank: 0,
                data: NodeData::Library { status },
            },
        )
    }

    /// Append an alias under `library`; multi-unit aliases get unit children
    /// when `with_units` is set.
    pub fn add_alias(
        &mut self,
        library: NodeId,
        lib_id: LibId,
        entry: &SymbolEntry,
        with_units: bool,
    ) -> NodeId {
        debug_assert_eq!(self.node(library).kind(), NodeKind::Library);
        let alias = self.push(
            library,
            Node {
                name: entry.name.clone(),
                description: entry.description.clone(),
                match_name: entry.name.to_lowercase(),
                parent: None,
                children: Vec::new(),
                score: 1,
                intrinsic_rank: 0,
                data: NodeData::Alias {
                    lib_id: lib_id.clone(),
                    search_text: entry.search_text(),
                    is_root: entry.is_root(),
                    power: entry.power,
                    unit_count: entry.unit_count,
                },
            },
        );

        if with_units && entry.unit_count > 1 {
            for unit in 1..=entry.unit_count {
                self.push(
                    alias,
                    Node {
                        name: format!("Unit {}", unit_letters(unit)),
                        description: String::new(),
                        match_name: String::new(),
                        parent: None,
                        children: Vec::new(),
                        score: 1,
                        intrinsic_rank: 0,
                        data: NodeData::Unit {
                            lib_id: lib_id.clone(),
                            unit,
                        },
                    },
                );
            }
        }

        let score = self.node(library).score.max(1);
        self.node_mut(library).score = score;
        alias
    }

    /// Visible children of `id`, in display order.
    pub fn visible_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|child| self.node(*child).is_visible())
    }

    /// Number of ancestors between `id` and the root (libraries are depth 0).
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if parent == NodeId::ROOT {
                break;
            }
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Sibling order: higher score first, then insertion order.
    pub fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        let (na, nb) = (self.node(a), self.node(b));
        nb.score
            .cmp(&na.score)
            .then(na.intrinsic_rank.cmp(&nb.intrinsic_rank))
    }

    /// Re-order every child list by [`SymbolTree::compare`].
    pub fn sort_nodes(&mut self) {
        for idx in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[idx].children);
            children.sort_by(|a, b| self.compare(*a, *b));
            self.nodes[idx].children = children;
        }
    }
}

/// Unit suffix letters: 1 → A, 26 → Z, 27 → AA.
pub fn unit_letters(unit: u32) -> String {
    let mut n = unit;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, units: u32) -> SymbolEntry {
        SymbolEntry {
            unit_count: units,
            ..SymbolEntry::new(name)
        }
    }

    #[test]
    fn test_unit_letters() {
        assert_eq!(unit_letters(1), "A");
        assert_eq!(unit_letters(26), "Z");
        assert_eq!(unit_letters(27), "AA");
        assert_eq!(unit_letters(28), "AB");
        assert_eq!(unit_letters(52), "AZ");
        assert_eq!(unit_letters(53), "BA");
    }

    #[test]
    fn test_parent_links_and_units() {
        let mut tree = SymbolTree::new();
        let lib = tree.add_library("Amplifier_Operational", "", LoadStatus::Loaded);
        let id = |name: &str| LibId::new("Amplifier_Operational", name);
        let single = tree.add_alias(lib, id("OPA333"), &entry("OPA333", 1), true);
        let dual = tree.add_alias(lib, id("LM358"), &entry("LM358", 3), true);

        assert_eq!(tree.node(single).parent, Some(lib));
        assert_eq!(tree.node(dual).parent, Some(lib));
        assert!(tree.node(single).children.is_empty());

        let units: Vec<_> = tree
            .node(dual)
            .children
            .iter()
            .map(|id| tree.node(*id).name.as_str())
            .collect();
        assert_eq!(units, vec!["Unit A", "Unit B", "Unit C"]);
        assert_eq!(tree.depth(lib), 0);
        assert_eq!(tree.depth(dual), 1);
        assert_eq!(tree.depth(tree.node(dual).children[0]), 2);
        assert_eq!(tree.node(lib).score, 1);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let mut tree = SymbolTree::new();
        let lib = tree.add_library("Device", "", LoadStatus::Loaded);
        let a = tree.add_alias(lib, LibId::new("Device", "A"), &entry("A", 1), false);
        let b = tree.add_alias(lib, LibId::new("Device", "B"), &entry("B", 1), false);
        let c = tree.add_alias(lib, LibId::new("Device", "C"), &entry("C", 1), false);

        tree.node_mut(c).score = 5;
        tree.sort_nodes();
        assert_eq!(tree.node(lib).children, vec![c, a, b]);

        tree.node_mut(c).score = 1;
        tree.sort_nodes();
        assert_eq!(tree.node(lib).children, vec![a, b, c]);
    }
}
