use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pcb_symbol_tree::{ExpandRule, NodeId, SymbolTreeAdapter};
use serde::Serialize;

use crate::OutputFormat;
use crate::config::Settings;
use crate::load::load_adapter;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search terms; every term must match
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Maximum number of results to print
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct HitOutput {
    lib_id: String,
    score: u32,
    description: String,
}

#[derive(Debug, Serialize)]
struct RevealOutput {
    node: String,
    rule: ExpandRule,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    total: usize,
    hits: Vec<HitOutput>,
    reveal: Option<RevealOutput>,
}

pub fn execute(args: SearchArgs, settings: &Settings) -> Result<()> {
    let mut adapter = load_adapter(settings)?;
    let query = args.query.join(" ");
    let output = run_search(&mut adapter, &query, args.limit);

    match args.format {
        OutputFormat::Text => print_text(&output),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}

fn run_search(adapter: &mut SymbolTreeAdapter, query: &str, limit: usize) -> SearchOutput {
    let hits = adapter.search(query);
    let total = hits.len();
    let reveal = adapter.last_expansion().map(|expansion| RevealOutput {
        node: reveal_label(adapter, expansion.node),
        rule: expansion.rule,
    });
    let hits = hits
        .into_iter()
        .take(limit)
        .map(|hit| HitOutput {
            description: adapter.value(hit.node, 1),
            lib_id: hit.lib_id.to_string(),
            score: hit.score,
        })
        .collect();

    SearchOutput {
        query: query.to_string(),
        total,
        hits,
        reveal,
    }
}

/// `Lib:Name`, with the unit letter appended for unit nodes.
pub fn reveal_label(adapter: &SymbolTreeAdapter, node: NodeId) -> String {
    match adapter.alias_for(node) {
        Some(lib_id) if adapter.unit_for(node) > 0 => {
            format!("{lib_id} ({})", adapter.value(node, 0))
        }
        Some(lib_id) => lib_id.to_string(),
        None => adapter.value(node, 0),
    }
}

fn print_text(output: &SearchOutput) {
    if output.hits.is_empty() {
        println!("No symbols match '{}'", output.query);
        return;
    }

    let width = output
        .hits
        .iter()
        .map(|hit| hit.lib_id.len())
        .max()
        .unwrap_or_default();
    for hit in &output.hits {
        println!(
            "{}  {}  {}",
            format!("{:>5}", hit.score).dimmed(),
            format!("{:<width$}", hit.lib_id).bold(),
            hit.description.dimmed()
        );
    }
    if output.total > output.hits.len() {
        println!(
            "{}",
            format!("... {} more", output.total - output.hits.len()).dimmed()
        );
    }
}
