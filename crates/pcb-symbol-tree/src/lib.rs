//! Searchable tree of KiCad symbol libraries.
//!
//! Libraries are loaded from a [`SymbolSource`] into a [`SymbolTreeAdapter`],
//! which scores every symbol against the user's search text, hides what does
//! not match and decides which node a chooser should reveal first.
//!
//! ```no_run
//! use pcb_symbol_tree::{DirectorySource, SymbolSource, SymbolTreeAdapter};
//!
//! let source = DirectorySource::open("/usr/share/kicad/symbols".as_ref())?;
//! let mut adapter = SymbolTreeAdapter::new();
//! for nickname in source.nicknames() {
//!     adapter.add_library(&source, &nickname);
//! }
//! for hit in adapter.search("opamp dual").iter().take(5) {
//!     println!("{} ({})", hit.lib_id, hit.score);
//! }
//! # Ok::<(), pcb_symbol_tree::LoadError>(())
//! ```

pub mod adapter;
pub mod kicad;
pub mod lib_id;
pub mod matcher;
pub mod search;
pub mod sexpr;
pub mod source;
pub mod tree;
pub mod view;
pub mod width;

pub use adapter::{ExpandRule, Expansion, Filter, SymbolTreeAdapter};
pub use kicad::LoadError;
pub use kicad::symbol_lib::SymbolEntry;
pub use lib_id::LibId;
pub use search::SearchHit;
pub use source::{DirectorySource, LibTable, MemorySource, SymbolSource};
pub use tree::{LoadStatus, NodeId, NodeKind};
pub use view::CellAttr;
pub use width::{Column, MonospaceMeasure, TextMeasure, WidthCache};
