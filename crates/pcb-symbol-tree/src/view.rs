//! Read-only accessors a list/tree view drives the adapter through.

use std::cmp::Ordering;

use serde::Serialize;

use crate::adapter::SymbolTreeAdapter;
use crate::tree::{NodeData, NodeId, NodeKind};
use crate::width::Column;

/// Text styling for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellAttr {
    pub italic: bool,
}

impl SymbolTreeAdapter {
    /// Visible children of `id`; the root's children are the libraries.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.tree().get(id) {
            Some(node) if node.is_visible() => self.tree().visible_children(id).collect(),
            _ => Vec::new(),
        }
    }

    /// `None` for the root and for libraries, whose parent is the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree()
            .get(id)?
            .parent
            .filter(|parent| *parent != NodeId::ROOT)
    }

    /// Root and libraries always; aliases when they carry unit nodes.
    pub fn is_container(&self, id: NodeId) -> bool {
        match self.tree().get(id) {
            Some(node) => match node.kind() {
                NodeKind::Root | NodeKind::Library => true,
                NodeKind::Alias => !node.children.is_empty(),
                NodeKind::Unit => false,
            },
            None => false,
        }
    }

    /// Containers still show their description column.
    pub fn has_container_columns(&self, id: NodeId) -> bool {
        self.is_container(id)
    }

    pub fn column_count(&self) -> usize {
        Column::ALL.len()
    }

    pub fn value(&self, id: NodeId, column: usize) -> String {
        let Some(node) = self.tree().get(id) else {
            return String::new();
        };
        match Column::from_index(column) {
            Some(Column::Part) => node.name.clone(),
            Some(Column::Description) => node.description.clone(),
            None => {
                log::warn!("no column {column} in the symbol tree");
                String::new()
            }
        }
    }

    /// Derived symbols (those that `extend` another) show their name in italics.
    pub fn attr(&self, id: NodeId, column: usize) -> CellAttr {
        let derived = matches!(
            self.tree().get(id).map(|n| &n.data),
            Some(NodeData::Alias { is_root: false, .. })
        );
        CellAttr {
            italic: derived && Column::from_index(column) == Some(Column::Part),
        }
    }

    pub fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        self.tree().compare(a, b)
    }
}
