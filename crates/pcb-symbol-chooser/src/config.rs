//! `pcb-symbols.toml` settings, merged with command-line flags.
//!
//! ```toml
//! lib_table = "~/.config/kicad/8.0/sym-lib-table"
//! show_units = true
//! filter = "power"
//! preselect = "Device:R"
//! preselect_unit = 0
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pcb_symbol_tree::{Filter, LibId};
use serde::Deserialize;

use crate::SourceArgs;

pub const CONFIG_FILE: &str = "pcb-symbols.toml";
const LIB_TABLE_FILE: &str = "sym-lib-table";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub lib_table: Option<PathBuf>,
    pub library_dir: Option<PathBuf>,
    pub show_units: Option<bool>,
    pub filter: Option<Filter>,
    pub preselect: Option<LibId>,
    pub preselect_unit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    Table(PathBuf),
    Directory(PathBuf),
}

/// Effective settings after merging.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: LibrarySource,
    pub show_units: bool,
    pub filter: Filter,
    pub preselect: Option<LibId>,
    pub preselect_unit: u32,
}

impl Config {
    /// Read `path`, or `./pcb-symbols.toml` if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(CONFIG_FILE);
                if !local.exists() {
                    return Ok(Self::default());
                }
                local
            }
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Flags win over the file; the library table defaults to KiCad's user table.
    pub fn resolve(self, args: &SourceArgs) -> Result<Settings> {
        let source = if let Some(dir) = &args.library_dir {
            LibrarySource::Directory(dir.clone())
        } else if let Some(table) = &args.lib_table {
            LibrarySource::Table(table.clone())
        } else if let Some(dir) = self.library_dir {
            LibrarySource::Directory(dir)
        } else if let Some(table) = self.lib_table {
            LibrarySource::Table(table)
        } else {
            LibrarySource::Table(default_lib_table()?)
        };

        let preselect = match &args.preselect {
            Some(text) => Some(text.parse::<LibId>()?),
            None => self.preselect,
        };

        Ok(Settings {
            source,
            show_units: !args.no_units && self.show_units.unwrap_or(true),
            filter: if args.power {
                Filter::Power
            } else {
                self.filter.unwrap_or_default()
            },
            preselect,
            preselect_unit: args.unit.or(self.preselect_unit).unwrap_or(0),
        })
    }
}

fn default_lib_table() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("No configuration directory; pass --lib-table")?
        .join("kicad");
    let table = newest_lib_table(&dir).unwrap_or_else(|| dir.join(LIB_TABLE_FILE));
    log::debug!("using library table {}", table.display());
    Ok(table)
}

/// KiCad keeps its user tables under `kicad/<major>.<minor>/`; pick the
/// newest version that has one.
fn newest_lib_table(kicad_dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(kicad_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let version = parse_version(entry.file_name().to_str()?)?;
            let table = entry.path().join(LIB_TABLE_FILE);
            table.is_file().then_some((version, table))
        })
        .max_by_key(|(version, _)| *version)
        .map(|(_, table)| table)
}

fn parse_version(name: &str) -> Option<(u32, u32)> {
    let (major, minor) = name.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
