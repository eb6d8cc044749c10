use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pcb_symbol_tree::{DirectorySource, LibTable, SymbolSource, SymbolTreeAdapter};

use crate::config::{LibrarySource, Settings};

pub fn open_source(source: &LibrarySource) -> Result<Box<dyn SymbolSource>> {
    Ok(match source {
        LibrarySource::Table(path) => Box::new(
            LibTable::open(path)
                .with_context(|| format!("Failed to open library table {}", path.display()))?,
        ),
        LibrarySource::Directory(dir) => Box::new(
            DirectorySource::open(dir)
                .with_context(|| format!("Failed to scan {}", dir.display()))?,
        ),
    })
}

/// Build a configured adapter and load every library into it.
pub fn load_adapter(settings: &Settings) -> Result<SymbolTreeAdapter> {
    let source = open_source(&settings.source)?;
    let mut adapter = SymbolTreeAdapter::new();
    adapter.set_filter(settings.filter);
    adapter.show_units(settings.show_units);
    if let Some(lib_id) = &settings.preselect {
        adapter.set_preselect_node(lib_id.clone(), settings.preselect_unit);
    }

    let nicknames = source.nicknames();
    let progress = ProgressBar::new(nicknames.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{spinner} Loading libraries [{bar:30}] {pos}/{len} {msg}",
    )?);
    adapter.add_libraries_with_progress(source.as_ref(), &nicknames, &mut |done, _, nickname| {
        progress.set_position(done as u64);
        progress.set_message(nickname.to_string());
    });
    progress.finish_and_clear();

    log::debug!(
        "loaded {} symbols from {} libraries",
        adapter.components_count(),
        adapter.libraries_count()
    );
    Ok(adapter)
}
