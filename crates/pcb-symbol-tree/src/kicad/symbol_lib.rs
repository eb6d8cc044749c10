//! `.kicad_sym` reader producing one [`SymbolEntry`] per top-level symbol.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use super::{LoadError, read_file};
use crate::sexpr::{self, Sexpr};

/// Derivation chains deeper than this are treated as broken.
const MAX_EXTENDS_DEPTH: usize = 16;

/// The chooser-relevant view of a library symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    pub name: String,
    /// Parent symbol for derived symbols
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    pub description: String,
    pub keywords: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub footprint_filters: Vec<String>,
    pub unit_count: u32,
    pub power: bool,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_count: 1,
            ..Default::default()
        }
    }

    /// Root symbols own their graphics; derived ones borrow them via `extends`.
    pub fn is_root(&self) -> bool {
        self.extends.is_none()
    }

    /// Lowercase haystack searched when a term misses the name.
    pub fn search_text(&self) -> String {
        let mut text = String::new();
        for part in [self.keywords.as_str(), self.description.as_str()]
            .into_iter()
            .chain(self.footprint_filters.iter().map(String::as_str))
        {
            if part.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(part);
        }
        text.to_lowercase()
    }
}

/// Parse the symbols of a library held in memory.
pub fn parse_symbol_lib(content: &str, origin: &str) -> Result<Vec<SymbolEntry>, LoadError> {
    let root = sexpr::parse(content).map_err(|source| LoadError::Syntax {
        origin: origin.to_string(),
        source,
    })?;
    if root.head() != Some("kicad_symbol_lib") {
        return Err(LoadError::Format {
            origin: origin.to_string(),
            expected: "KiCad symbol library",
        });
    }

    let mut entries: Vec<SymbolEntry> =
        root.lists_named("symbol").filter_map(parse_symbol).collect();
    resolve_extends(&mut entries);
    log::debug!("parsed {} symbols from {origin}", entries.len());
    Ok(entries)
}

pub fn read_symbol_lib(path: &Path) -> Result<Vec<SymbolEntry>, LoadError> {
    let content = read_file(path)?;
    parse_symbol_lib(&content, &path.display().to_string())
}

fn parse_symbol(items: &[Sexpr]) -> Option<SymbolEntry> {
    let Some(name) = items.get(1).and_then(Sexpr::as_atom) else {
        log::warn!("skipping symbol without a name");
        return None;
    };
    let mut entry = SymbolEntry::new(name);
    let mut description_fallback = None;

    for item in &items[2..] {
        let Some(list) = item.as_list() else {
            continue;
        };
        match list.first().and_then(Sexpr::as_sym) {
            Some("extends") => {
                entry.extends = list.get(1).and_then(Sexpr::as_atom).map(str::to_string);
            }
            Some("power") => entry.power = true,
            Some("property") => {
                let key = list.get(1).and_then(Sexpr::as_atom);
                let value = list.get(2).and_then(Sexpr::as_atom).unwrap_or_default();
                match key {
                    Some("Description") => entry.description = value.to_string(),
                    Some("ki_description") => description_fallback = Some(value.to_string()),
                    Some("ki_keywords") => entry.keywords = value.to_string(),
                    Some("ki_fp_filters") => {
                        entry.footprint_filters =
                            value.split_whitespace().map(str::to_string).collect();
                    }
                    _ => {}
                }
            }
            Some("symbol") => {
                let unit = list
                    .get(1)
                    .and_then(Sexpr::as_atom)
                    .map(nested_unit)
                    .unwrap_or_default();
                entry.unit_count = entry.unit_count.max(unit);
            }
            _ => {}
        }
    }

    if entry.description.is_empty() {
        entry.description = description_fallback.unwrap_or_default();
    }
    Some(entry)
}

/// Unit number from a nested section name `<base>_<unit>_<style>`.
fn nested_unit(name: &str) -> u32 {
    let mut parts = name.rsplitn(3, '_');
    let _style = parts.next();
    parts.next().and_then(|s| s.parse().ok()).unwrap_or_default()
}

/// Copy inherited fields from the root of each derivation chain.
fn resolve_extends(entries: &mut [SymbolEntry]) {
    let index: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.name.clone(), idx))
        .collect();

    for idx in 0..entries.len() {
        if entries[idx].is_root() {
            continue;
        }

        let mut current = idx;
        let mut depth = 0;
        while let Some(parent) = entries[current].extends.as_deref() {
            match index.get(parent) {
                Some(&parent_idx) if depth < MAX_EXTENDS_DEPTH => {
                    current = parent_idx;
                    depth += 1;
                }
                _ => {
                    log::warn!(
                        "symbol '{}' extends '{}' which cannot be resolved",
                        entries[idx].name,
                        parent
                    );
                    break;
                }
            }
        }
        if current == idx {
            continue;
        }

        let root = entries[current].clone();
        let entry = &mut entries[idx];
        entry.power = root.power;
        entry.unit_count = root.unit_count;
        if entry.description.is_empty() {
            entry.description = root.description;
        }
        if entry.keywords.is_empty() {
            entry.keywords = root.keywords;
        }
        if entry.footprint_filters.is_empty() {
            entry.footprint_filters = root.footprint_filters;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB: &str = r#"(kicad_symbol_lib (version 20231120) (generator kicad_symbol_editor)
        (symbol "R"
            (pin_numbers hide) (in_bom yes) (on_board yes)
            (property "Reference" "R" (at 2.032 0 90))
            (property "Description" "Resistor" (at 0 0 0))
            (property "ki_keywords" "R res resistor" (at 0 0 0))
            (property "ki_fp_filters" "R_*" (at 0 0 0))
            (symbol "R_0_1" (rectangle (start -1.016 -2.54) (end 1.016 2.54)))
            (symbol "R_1_1" (pin passive line (at 0 3.81 270) (length 1.27)
                (name "~" (effects (font (size 1.27 1.27))))
                (number "1" (effects (font (size 1.27 1.27))))))
        )
        (symbol "R_US" (extends "R")
            (property "Description" "Resistor, US symbol" (at 0 0 0))
        )
        (symbol "LM358"
            (property "ki_description" "Low-Power, Dual Operational Amplifiers" (at 0 0 0))
            (symbol "LM358_1_1") (symbol "LM358_2_1") (symbol "LM358_3_1")
        )
        (symbol "GND" (power) (property "Description" "Power symbol creates a global label with name \"GND\"" (at 0 0 0)))
    )"#;

    #[test]
    fn test_parse_entries() {
        let entries = parse_symbol_lib(LIB, "Device.kicad_sym").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["R", "R_US", "LM358", "GND"]);

        let r = &entries[0];
        assert_eq!(r.description, "Resistor");
        assert_eq!(r.keywords, "R res resistor");
        assert_eq!(r.footprint_filters, vec!["R_*"]);
        assert_eq!(r.unit_count, 1);
        assert!(r.is_root());
        assert!(!r.power);

        assert_eq!(entries[2].unit_count, 3);
        assert_eq!(
            entries[2].description,
            "Low-Power, Dual Operational Amplifiers"
        );
        assert!(entries[3].power);
    }

    #[test]
    fn test_derived_symbol_inherits() {
        let entries = parse_symbol_lib(LIB, "Device.kicad_sym").unwrap();
        let us = &entries[1];
        assert!(!us.is_root());
        assert_eq!(us.description, "Resistor, US symbol");
        assert_eq!(us.keywords, "R res resistor");
        assert_eq!(us.footprint_filters, vec!["R_*"]);
    }

    #[test]
    fn test_search_text() {
        let entries = parse_symbol_lib(LIB, "Device.kicad_sym").unwrap();
        assert_eq!(entries[0].search_text(), "r res resistor resistor r_*");
    }

    #[test]
    fn test_rejects_other_files() {
        let err = parse_symbol_lib("(sym_lib_table)", "table").unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
        let err = parse_symbol_lib("(kicad_symbol_lib", "broken").unwrap_err();
        assert!(matches!(err, LoadError::Syntax { .. }));
    }

    #[test]
    fn test_extends_cycle_is_tolerated() {
        let lib = r#"(kicad_symbol_lib
            (symbol "A" (extends "B"))
            (symbol "B" (extends "A")))"#;
        let entries = parse_symbol_lib(lib, "cycle").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_root());
    }
}
