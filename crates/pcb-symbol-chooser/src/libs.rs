use anyhow::Result;
use clap::Args;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use pcb_symbol_tree::tree::NodeData;
use pcb_symbol_tree::{LoadStatus, SymbolTreeAdapter};
use serde::Serialize;

use crate::OutputFormat;
use crate::config::Settings;
use crate::load::load_adapter;

#[derive(Args, Debug)]
pub struct LibsArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct LibraryOutput {
    nickname: String,
    description: String,
    symbols: usize,
    status: LoadStatus,
}

pub fn execute(args: LibsArgs, settings: &Settings) -> Result<()> {
    let adapter = load_adapter(settings)?;
    let libraries = libraries(&adapter);

    match args.format {
        OutputFormat::Text => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
            table.set_header(vec!["Library", "Symbols", "Status", "Description"]);
            for lib in &libraries {
                let status = match &lib.status {
                    LoadStatus::Loaded => "ok".to_string(),
                    LoadStatus::Failed(message) => format!("failed: {message}"),
                };
                table.add_row(vec![
                    lib.nickname.clone(),
                    lib.symbols.to_string(),
                    status,
                    lib.description.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&libraries)?),
    }
    Ok(())
}

fn libraries(adapter: &SymbolTreeAdapter) -> Vec<LibraryOutput> {
    adapter
        .tree()
        .libraries()
        .iter()
        .map(|id| {
            let node = adapter.tree().node(*id);
            let status = match &node.data {
                NodeData::Library { status } => status.clone(),
                _ => LoadStatus::Loaded,
            };
            LibraryOutput {
                nickname: node.name.clone(),
                description: node.description.clone(),
                symbols: node.children.len(),
                status,
            }
        })
        .collect()
}
