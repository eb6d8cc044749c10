//! Column width computation with a memoized text measure.
//!
//! Measuring text can be slow on some frontends, so widths are cached by
//! measure and content. Symbol names and descriptions never change after loading, so
//! the cache is never invalidated.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::tree::{NodeId, SymbolTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Part,
    Description,
}

impl Column {
    pub const ALL: [Column; 2] = [Column::Part, Column::Description];

    pub fn index(self) -> usize {
        match self {
            Column::Part => 0,
            Column::Description => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn heading(self) -> &'static str {
        match self {
            Column::Part => "Part",
            Column::Description => "Description",
        }
    }
}

/// Something that knows how wide a string renders.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> u32;

    /// Identifies the measure in a [`WidthCache`]; two measures with the
    /// same key must report the same widths.
    fn cache_key(&self) -> String;
}

/// Fixed-pitch measure: Unicode display columns times a cell width.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    pub cell_width: u32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { cell_width: 1 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str) -> u32 {
        u32::try_from(text.width())
            .unwrap_or(u32::MAX)
            .saturating_mul(self.cell_width)
    }

    fn cache_key(&self) -> String {
        format!("monospace:{}", self.cell_width)
    }
}

static GLOBAL_CACHE: Lazy<WidthCache> = Lazy::new(WidthCache::new);

/// Measure key, column, text.
type CacheKey = (String, Column, String);

#[derive(Debug, Default)]
pub struct WidthCache {
    cells: Mutex<HashMap<CacheKey, u32>>,
    headings: Mutex<HashMap<CacheKey, u32>>,
}

impl WidthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static WidthCache {
        &GLOBAL_CACHE
    }

    pub fn cell_width(&self, column: Column, text: &str, measure: &dyn TextMeasure) -> u32 {
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        lookup(&mut cells, column, text, measure)
    }

    /// Headings are keyed by their text, not just the column.
    pub fn heading_width(&self, column: Column, heading: &str, measure: &dyn TextMeasure) -> u32 {
        let mut headings = self.headings.lock().unwrap_or_else(|e| e.into_inner());
        lookup(&mut headings, column, heading, measure)
    }

    pub fn cached_cells(&self) -> usize {
        self.cells.lock().map(|c| c.len()).unwrap_or_default()
    }
}

fn lookup(
    entries: &mut HashMap<CacheKey, u32>,
    column: Column,
    text: &str,
    measure: &dyn TextMeasure,
) -> u32 {
    *entries
        .entry((measure.cache_key(), column, text.to_string()))
        .or_insert_with(|| measure.text_width(text))
}

/// Width needed to show `column` for every visible node under `id`.
///
/// The part column reserves `indent` for the expander and one more `indent`
/// per tree level.
pub fn column_width(
    tree: &SymbolTree,
    id: NodeId,
    column: Column,
    indent: u32,
    cache: &WidthCache,
    measure: &dyn TextMeasure,
) -> u32 {
    let heading = cache.heading_width(column, column.heading(), measure);
    let node = tree.node(id);
    if !node.is_visible() {
        return heading;
    }

    let mut width = heading;
    if id != NodeId::ROOT {
        width = width.max(cell_width(tree, id, column, indent, cache, measure));
    }

    let child_indent = match column {
        Column::Part if id != NodeId::ROOT => indent,
        _ => 0,
    };
    for child in tree.visible_children(id) {
        let child_width = column_width(tree, child, column, indent, cache, measure);
        width = width.max(child_width.saturating_add(child_indent));
    }
    width
}

fn cell_width(
    tree: &SymbolTree,
    id: NodeId,
    column: Column,
    indent: u32,
    cache: &WidthCache,
    measure: &dyn TextMeasure,
) -> u32 {
    let node = tree.node(id);
    match column {
        Column::Part => cache
            .cell_width(column, &node.name, measure)
            .saturating_add(indent),
        Column::Description => cache.cell_width(column, &node.description, measure),
    }
}
