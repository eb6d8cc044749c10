//! KiCad file formats feeding the chooser tree.

pub mod lib_table;
pub mod symbol_lib;

use std::path::PathBuf;

use thiserror::Error;

use crate::LibId;
use crate::sexpr::SexprError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed s-expression in {origin}")]
    Syntax {
        origin: String,
        #[source]
        source: SexprError,
    },

    #[error("{origin} is not a {expected}")]
    Format {
        origin: String,
        expected: &'static str,
    },

    #[error("library '{0}' is not in the library table")]
    UnknownLibrary(String),

    #[error("symbol '{0}' not found")]
    UnknownSymbol(LibId),
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
