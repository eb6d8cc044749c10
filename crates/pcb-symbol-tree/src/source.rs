//! Where the chooser gets its libraries from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::LibId;
use crate::kicad::LoadError;
use crate::kicad::lib_table::LibTableRows;
use crate::kicad::symbol_lib::{SymbolEntry, read_symbol_lib};

/// A provider of symbol libraries addressed by nickname.
pub trait SymbolSource {
    /// Nicknames available for loading, in display order.
    fn nicknames(&self) -> Vec<String>;

    /// Human readable description shown next to the library name.
    fn description(&self, _nickname: &str) -> Option<String> {
        None
    }

    fn load(&self, nickname: &str) -> Result<Vec<SymbolEntry>, LoadError>;

    fn load_symbol(&self, id: &LibId) -> Result<SymbolEntry, LoadError> {
        self.load(id.nickname())?
            .into_iter()
            .find(|entry| entry.name == id.item_name())
            .ok_or_else(|| LoadError::UnknownSymbol(id.clone()))
    }
}

/// Libraries listed in a `sym-lib-table`.
#[derive(Debug, Clone)]
pub struct LibTable {
    rows: LibTableRows,
}

impl LibTable {
    pub fn new(rows: LibTableRows) -> Self {
        Self { rows }
    }

    pub fn open(path: &Path) -> Result<Self, LoadError> {
        Ok(Self::new(LibTableRows::read(path)?))
    }

    pub fn rows(&self) -> &LibTableRows {
        &self.rows
    }
}

impl SymbolSource for LibTable {
    fn nicknames(&self) -> Vec<String> {
        self.rows.nicknames()
    }

    fn description(&self, nickname: &str) -> Option<String> {
        self.rows
            .find(nickname)
            .map(|row| row.description.clone())
            .filter(|d| !d.is_empty())
    }

    fn load(&self, nickname: &str) -> Result<Vec<SymbolEntry>, LoadError> {
        let row = self
            .rows
            .find(nickname)
            .ok_or_else(|| LoadError::UnknownLibrary(nickname.to_string()))?;
        if row.lib_type != "KiCad" {
            log::warn!(
                "library '{}' has type '{}', reading it as a KiCad symbol library",
                row.nickname,
                row.lib_type
            );
        }
        read_symbol_lib(Path::new(&row.uri))
    }
}

/// Every `*.kicad_sym` file of a directory, nicknamed by file stem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    libraries: BTreeMap<String, PathBuf>,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut libraries = BTreeMap::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("kicad_sym") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                libraries.insert(stem.to_string(), path.clone());
            }
        }
        log::debug!("found {} libraries in {}", libraries.len(), dir.display());
        Ok(Self { libraries })
    }
}

impl SymbolSource for DirectorySource {
    fn nicknames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.libraries.keys().cloned().collect();
        names.sort_by(|a, b| natord::compare(a, b));
        names
    }

    fn load(&self, nickname: &str) -> Result<Vec<SymbolEntry>, LoadError> {
        let path = self
            .libraries
            .get(nickname)
            .ok_or_else(|| LoadError::UnknownLibrary(nickname.to_string()))?;
        read_symbol_lib(path)
    }
}

/// Libraries held in memory, mostly for tests and synthetic groups.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    libraries: Vec<(String, Vec<SymbolEntry>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, nickname: impl Into<String>, entries: Vec<SymbolEntry>) -> Self {
        self.libraries.push((nickname.into(), entries));
        self
    }
}

impl SymbolSource for MemorySource {
    fn nicknames(&self) -> Vec<String> {
        self.libraries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn load(&self, nickname: &str) -> Result<Vec<SymbolEntry>, LoadError> {
        self.libraries
            .iter()
            .find(|(name, _)| name == nickname)
            .map(|(_, entries)| entries.clone())
            .ok_or_else(|| LoadError::UnknownLibrary(nickname.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        let lib =
            r#"(kicad_symbol_lib (symbol "R" (property "Description" "Resistor" (at 0 0 0))))"#;
        std::fs::write(dir.path().join("Device.kicad_sym"), lib).unwrap();
        std::fs::write(dir.path().join("Lib10.kicad_sym"), "(kicad_symbol_lib)").unwrap();
        std::fs::write(dir.path().join("Lib9.kicad_sym"), "(kicad_symbol_lib)").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = DirectorySource::open(dir.path()).unwrap();
        assert_eq!(source.nicknames(), vec!["Device", "Lib9", "Lib10"]);

        let r = source.load_symbol(&LibId::new("Device", "R")).unwrap();
        assert_eq!(r.description, "Resistor");

        let missing = source.load_symbol(&LibId::new("Device", "C")).unwrap_err();
        assert!(matches!(missing, LoadError::UnknownSymbol(_)));
        assert!(matches!(
            source.load("Nope").unwrap_err(),
            LoadError::UnknownLibrary(_)
        ));
    }
}
