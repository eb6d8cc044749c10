//! `sym-lib-table` reader.
//!
//! ```text
//! (sym_lib_table
//!   (version 7)
//!   (lib (name "Device")(type "KiCad")(uri "${KICAD_SYMBOL_DIR}/Device.kicad_sym")(options "")(descr "Generic symbols"))
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{LoadError, read_file};
use crate::sexpr::{self, Sexpr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibTableRow {
    pub nickname: String,
    pub lib_type: String,
    /// URI after variable expansion
    pub uri: String,
    pub options: String,
    pub description: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibTableRows {
    rows: Vec<LibTableRow>,
}

impl LibTableRows {
    /// Parse table text; `base_dir` resolves relative URIs and `${KIPRJMOD}`.
    pub fn parse(content: &str, origin: &str, base_dir: Option<&Path>) -> Result<Self, LoadError> {
        let root = sexpr::parse(content).map_err(|source| LoadError::Syntax {
            origin: origin.to_string(),
            source,
        })?;
        if root.head() != Some("sym_lib_table") {
            return Err(LoadError::Format {
                origin: origin.to_string(),
                expected: "symbol library table",
            });
        }

        let lookup = |name: &str| -> Option<String> {
            if name == "KIPRJMOD" {
                if let Some(dir) = base_dir {
                    return Some(dir.display().to_string());
                }
            }
            std::env::var(name).ok()
        };

        let mut rows = Vec::new();
        for lib in root.lists_named("lib") {
            let lib = Sexpr::List(lib.to_vec());
            let Some(nickname) = lib.child_value("name") else {
                log::warn!("{origin}: skipping library entry without a name");
                continue;
            };
            let raw_uri = lib.child_value("uri").unwrap_or_default();
            let uri = resolve_uri(&expand_vars(raw_uri, &lookup), base_dir);
            rows.push(LibTableRow {
                nickname: nickname.to_string(),
                lib_type: lib.child_value("type").unwrap_or("KiCad").to_string(),
                uri,
                options: lib.child_value("options").unwrap_or_default().to_string(),
                description: lib.child_value("descr").unwrap_or_default().to_string(),
                disabled: lib.list_named("disabled").is_some(),
            });
        }
        log::debug!("{origin}: {} library rows", rows.len());
        Ok(Self { rows })
    }

    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let content = read_file(path)?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::parse(&content, &path.display().to_string(), Some(base_dir))
    }

    pub fn rows(&self) -> &[LibTableRow] {
        &self.rows
    }

    pub fn find(&self, nickname: &str) -> Option<&LibTableRow> {
        self.rows.iter().find(|row| row.nickname == nickname)
    }

    /// Nicknames of enabled rows, in table order.
    pub fn nicknames(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| !row.disabled)
            .map(|row| row.nickname.clone())
            .collect()
    }
}

/// Expand `${VAR}` and `$(VAR)` references; unknown variables are left as written.
pub fn expand_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let close = match tail.as_bytes().get(1) {
            Some(b'{') => '}',
            Some(b'(') => ')',
            _ => {
                out.push('$');
                rest = &tail[1..];
                continue;
            }
        };
        let Some(end) = tail.find(close) else {
            out.push_str(tail);
            return out;
        };
        let name = &tail[2..end];
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_uri(uri: &str, base_dir: Option<&Path>) -> String {
    let path = PathBuf::from(uri);
    match base_dir {
        Some(dir) if path.is_relative() && !uri.contains('$') && !uri.is_empty() => {
            dir.join(path).display().to_string()
        }
        _ => uri.to_string(),
    }
}
