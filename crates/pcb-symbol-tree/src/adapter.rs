//! The chooser adapter: owns the tree, loads libraries into it and drives
//! search, filtering and the expansion policy for whatever view sits on top.
//!
//! Typical use:
//!
//! - [`SymbolTreeAdapter::set_filter`], [`SymbolTreeAdapter::show_units`],
//!   [`SymbolTreeAdapter::set_preselect_node`] configure the adapter
//! - [`SymbolTreeAdapter::add_library`] / [`SymbolTreeAdapter::add_alias_list`]
//!   populate it
//! - [`SymbolTreeAdapter::update_search_string`] runs a search and picks the
//!   node to reveal

use natord::compare as natural_compare;
use serde::{Deserialize, Serialize};

use crate::LibId;
use crate::kicad::symbol_lib::SymbolEntry;
use crate::search::SearchHit;
use crate::source::SymbolSource;
use crate::tree::{LoadStatus, NodeData, NodeId, NodeKind, SymbolTree};
use crate::width::{Column, TextMeasure, WidthCache, column_width};

/// Default indent, in measure units, for the part column.
pub const DEFAULT_INDENT: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Load every symbol
    #[default]
    None,
    /// Load power symbols only
    Power,
}

/// Which rule picked the node to reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandRule {
    SearchResult,
    Preselect,
    SingleLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Expansion {
    pub node: NodeId,
    pub rule: ExpandRule,
}

#[derive(Debug)]
pub struct SymbolTreeAdapter {
    tree: SymbolTree,
    filter: Filter,
    show_units: bool,
    preselect_lib_id: LibId,
    preselect_unit: u32,
    search: String,
    last_expansion: Option<Expansion>,
    indent: u32,
}

impl Default for SymbolTreeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTreeAdapter {
    pub fn new() -> Self {
        Self {
            tree: SymbolTree::new(),
            filter: Filter::None,
            show_units: true,
            preselect_lib_id: LibId::default(),
            preselect_unit: 0,
            search: String::new(),
            last_expansion: None,
            indent: DEFAULT_INDENT,
        }
    }

    pub fn tree(&self) -> &SymbolTree {
        &self.tree
    }

    /// Must be set before libraries are added.
    pub fn set_filter(&mut self, filter: Filter) {
        if !self.tree.is_empty() {
            log::warn!("filter changed after libraries were loaded; existing nodes are kept");
        }
        self.filter = filter;
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Unit nodes are created for multi-unit symbols added after this call.
    pub fn show_units(&mut self, show: bool) {
        self.show_units = show;
    }

    pub fn units_shown(&self) -> bool {
        self.show_units
    }

    /// Node to highlight when nothing is searched; `unit` 0 selects the alias.
    pub fn set_preselect_node(&mut self, lib_id: LibId, unit: u32) {
        self.preselect_lib_id = lib_id;
        self.preselect_unit = unit;
    }

    pub fn set_indent(&mut self, indent: u32) {
        self.indent = indent;
    }

    /// Add every symbol of `nickname`, in natural name order.
    ///
    /// A library that fails to load still gets a node, marked
    /// [`LoadStatus::Failed`] and without children.
    pub fn add_library(&mut self, source: &dyn SymbolSource, nickname: &str) -> NodeId {
        let description = source.description(nickname).unwrap_or_default();
        match source.load(nickname) {
            Ok(entries) => {
                let lib = self.tree.add_library(nickname, description, LoadStatus::Loaded);
                let added = self.add_entries(lib, nickname, sorted_entries(entries));
                log::debug!("loaded {added} symbols from library '{nickname}'");
                lib
            }
            Err(e) => {
                log::warn!("failed to load library '{nickname}': {e}");
                self.tree
                    .add_library(nickname, description, LoadStatus::Failed(e.to_string()))
            }
        }
    }

    /// Add several libraries, reporting `(done, total, nickname)` before each.
    pub fn add_libraries_with_progress(
        &mut self,
        source: &dyn SymbolSource,
        nicknames: &[String],
        progress: &mut dyn FnMut(usize, usize, &str),
    ) {
        let total = nicknames.len();
        for (done, nickname) in nicknames.iter().enumerate() {
            progress(done, total, nickname);
            self.add_library(source, nickname);
        }
        progress(total, total, "");
    }

    /// Add a synthetic group (e.g. recently used symbols) from entries that
    /// already carry their library-qualified ids.
    pub fn add_alias_list(
        &mut self,
        node_name: &str,
        aliases: Vec<(LibId, SymbolEntry)>,
    ) -> NodeId {
        let lib = self.tree.add_library(node_name, "", LoadStatus::Loaded);
        for (lib_id, entry) in aliases {
            if self.accepts(&entry) {
                self.tree.add_alias(lib, lib_id, &entry, self.show_units);
            }
        }
        lib
    }

    /// Like [`SymbolTreeAdapter::add_alias_list`], resolving ids through
    /// `source`. Unknown ids are skipped.
    pub fn add_alias_list_by_id(
        &mut self,
        node_name: &str,
        ids: &[LibId],
        source: &dyn SymbolSource,
    ) -> NodeId {
        let aliases = ids
            .iter()
            .filter_map(|id| match source.load_symbol(id) {
                Ok(entry) => Some((id.clone(), entry)),
                Err(e) => {
                    log::warn!("skipping '{id}' in '{node_name}': {e}");
                    None
                }
            })
            .collect();
        self.add_alias_list(node_name, aliases)
    }

    fn accepts(&self, entry: &SymbolEntry) -> bool {
        match self.filter {
            Filter::None => true,
            Filter::Power => entry.power,
        }
    }

    fn add_entries(&mut self, lib: NodeId, nickname: &str, entries: Vec<SymbolEntry>) -> usize {
        let mut added = 0;
        for entry in entries {
            if !self.accepts(&entry) {
                continue;
            }
            let lib_id = LibId::new(nickname, entry.name.clone());
            self.tree.add_alias(lib, lib_id, &entry, self.show_units);
            added += 1;
        }
        added
    }

    /// Re-score, filter and re-order the tree for `search`, then pick the
    /// node a view should reveal.
    pub fn update_search_string(&mut self, search: &str) -> Option<Expansion> {
        self.search = search.to_string();
        self.tree.apply_search(search);
        self.last_expansion = self.expand_policy();
        if let Some(expansion) = &self.last_expansion {
            log::debug!(
                "revealing {:?} via {:?}",
                self.tree.node(expansion.node).name,
                expansion.rule
            );
        }
        self.last_expansion
    }

    /// Run a search and return the visible aliases, best first.
    pub fn search(&mut self, search: &str) -> Vec<SearchHit> {
        self.update_search_string(search);
        self.tree.hits()
    }

    pub fn search_string(&self) -> &str {
        &self.search
    }

    pub fn last_expansion(&self) -> Option<Expansion> {
        self.last_expansion
    }

    /// Best search hit, else the preselected node, else the only library.
    pub fn expand_policy(&self) -> Option<Expansion> {
        self.show_results()
            .map(|node| Expansion {
                node,
                rule: ExpandRule::SearchResult,
            })
            .or_else(|| {
                self.show_preselect().map(|node| Expansion {
                    node,
                    rule: ExpandRule::Preselect,
                })
            })
            .or_else(|| {
                self.show_single_library().map(|node| Expansion {
                    node,
                    rule: ExpandRule::SingleLibrary,
                })
            })
    }

    /// First visible node, depth first in display order, accepted by `pred`.
    pub fn find_and_expand(&self, pred: &dyn Fn(NodeId) -> bool) -> Option<NodeId> {
        fn walk(
            tree: &SymbolTree,
            id: NodeId,
            pred: &dyn Fn(NodeId) -> bool,
        ) -> Option<NodeId> {
            for child in tree.visible_children(id) {
                if pred(child) {
                    return Some(child);
                }
                if let Some(found) = walk(tree, child, pred) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.tree, NodeId::ROOT, pred)
    }

    fn show_results(&self) -> Option<NodeId> {
        self.find_and_expand(&|id| {
            let node = self.tree.node(id);
            node.kind() == NodeKind::Alias && node.score > 1
        })
    }

    fn show_preselect(&self) -> Option<NodeId> {
        if !self.preselect_lib_id.is_valid() {
            return None;
        }
        let want_unit = self.show_units && self.preselect_unit > 0;
        self.find_and_expand(&|id| match &self.tree.node(id).data {
            NodeData::Alias { lib_id, .. } => {
                let has_units = !self.tree.node(id).children.is_empty();
                (!has_units || !want_unit) && *lib_id == self.preselect_lib_id
            }
            NodeData::Unit { lib_id, unit } => {
                want_unit && *lib_id == self.preselect_lib_id && *unit == self.preselect_unit
            }
            _ => false,
        })
    }

    fn show_single_library(&self) -> Option<NodeId> {
        if self.libraries_count() != 1 {
            return None;
        }
        self.find_and_expand(&|id| self.tree.node(id).kind() == NodeKind::Alias)
    }

    /// Library-qualified id of an alias or unit node.
    pub fn alias_for(&self, id: NodeId) -> Option<&LibId> {
        self.tree.get(id)?.lib_id()
    }

    /// Unit of a unit node; 0 for the alias itself or anything else.
    pub fn unit_for(&self, id: NodeId) -> u32 {
        match self.tree.get(id).map(|n| &n.data) {
            Some(NodeData::Unit { unit, .. }) => *unit,
            _ => 0,
        }
    }

    /// Node kind, or `None` for an id this tree never issued.
    pub fn type_for(&self, id: NodeId) -> Option<NodeKind> {
        self.tree.get(id).map(|n| n.kind())
    }

    /// Number of aliases across all libraries and groups.
    pub fn components_count(&self) -> usize {
        self.tree
            .libraries()
            .iter()
            .map(|lib| self.tree.node(*lib).children.len())
            .sum()
    }

    pub fn libraries_count(&self) -> usize {
        self.tree.libraries().len()
    }

    /// Node of the first alias with this id, visible or not.
    pub fn find_item(&self, lib_id: &LibId) -> Option<NodeId> {
        self.tree.libraries().iter().find_map(|lib| {
            self.tree
                .node(*lib)
                .children
                .iter()
                .copied()
                .find(|alias| self.tree.node(*alias).lib_id() == Some(lib_id))
        })
    }

    /// Width needed for `column` using the process-wide cache.
    pub fn column_width(&self, column: Column, measure: &dyn TextMeasure) -> u32 {
        self.column_width_with(column, WidthCache::global(), measure)
    }

    pub fn column_width_with(
        &self,
        column: Column,
        cache: &WidthCache,
        measure: &dyn TextMeasure,
    ) -> u32 {
        column_width(&self.tree, NodeId::ROOT, column, self.indent, cache, measure)
    }
}

fn sorted_entries(mut entries: Vec<SymbolEntry>) -> Vec<SymbolEntry> {
    entries.sort_by(|a, b| natural_compare(&a.name, &b.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn entry(name: &str, description: &str) -> SymbolEntry {
        SymbolEntry {
            description: description.to_string(),
            ..SymbolEntry::new(name)
        }
    }

    fn power(name: &str) -> SymbolEntry {
        SymbolEntry {
            power: true,
            ..SymbolEntry::new(name)
        }
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_library(
                "Device",
                vec![
                    entry("R10", "Resistor"),
                    entry("R2", "Resistor"),
                    entry("C", "Unpolarized capacitor"),
                ],
            )
            .with_library(
                "power",
                vec![power("GND"), power("+3V3"), entry("PWR_FLAG", "")],
            )
    }

    fn names(adapter: &SymbolTreeAdapter, id: NodeId) -> Vec<String> {
        adapter
            .children(id)
            .into_iter()
            .map(|c| adapter.tree().node(c).name.clone())
            .collect()
    }

    #[test]
    fn test_library_is_natural_sorted() {
        let mut adapter = SymbolTreeAdapter::new();
        let lib = adapter.add_library(&source(), "Device");
        adapter.update_search_string("");
        assert_eq!(names(&adapter, lib), vec!["C", "R2", "R10"]);
        assert_eq!(adapter.components_count(), 3);
    }

    #[test]
    fn test_power_filter() {
        let mut adapter = SymbolTreeAdapter::new();
        adapter.set_filter(Filter::Power);
        let src = source();
        adapter.add_library(&src, "Device");
        let power = adapter.add_library(&src, "power");
        assert_eq!(adapter.components_count(), 2);
        assert_eq!(adapter.libraries_count(), 2);
        adapter.update_search_string("");
        // Device has nothing left and is hidden
        assert_eq!(adapter.children(NodeId::ROOT), vec![power]);
    }

    #[test]
    fn test_failed_library_gets_status() {
        let mut adapter = SymbolTreeAdapter::new();
        let lib = adapter.add_library(&source(), "Missing");
        assert!(matches!(
            adapter.tree().node(lib).data,
            NodeData::Library {
                status: LoadStatus::Failed(_)
            }
        ));
        assert_eq!(adapter.components_count(), 0);
    }

    #[test]
    fn test_lookups() {
        let mut adapter = SymbolTreeAdapter::new();
        let src = source();
        adapter.add_libraries_with_progress(&src, &src.nicknames(), &mut |_, _, _| {});
        let id = LibId::new("power", "GND");
        let node = adapter.find_item(&id).unwrap();
        assert_eq!(adapter.alias_for(node), Some(&id));
        assert_eq!(adapter.unit_for(node), 0);
        assert_eq!(adapter.type_for(node), Some(NodeKind::Alias));
        assert_eq!(adapter.type_for(NodeId::ROOT), Some(NodeKind::Root));
        assert!(adapter.find_item(&LibId::new("power", "VCC")).is_none());
    }

    #[test]
    fn test_progress_reports_each_library() {
        let mut adapter = SymbolTreeAdapter::new();
        let src = source();
        let mut seen = Vec::new();
        adapter.add_libraries_with_progress(&src, &src.nicknames(), &mut |done, total, name| {
            seen.push((done, total, name.to_string()));
        });
        assert_eq!(
            seen,
            vec![
                (0, 2, "Device".to_string()),
                (1, 2, "power".to_string()),
                (2, 2, String::new()),
            ]
        );
    }

    #[test]
    fn test_alias_list_by_id_skips_unknown() {
        let mut adapter = SymbolTreeAdapter::new();
        let src = source();
        let history = adapter.add_alias_list_by_id(
            "-- History --",
            &[LibId::new("Device", "C"), LibId::new("Device", "L")],
            &src,
        );
        adapter.update_search_string("");
        assert_eq!(names(&adapter, history), vec!["C"]);
    }
}
