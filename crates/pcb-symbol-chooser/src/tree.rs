use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pcb_symbol_tree::{Column, MonospaceMeasure, NodeId, NodeKind, SymbolTreeAdapter};
use serde::Serialize;
use termtree::Tree;

use crate::OutputFormat;
use crate::config::Settings;
use crate::load::load_adapter;
use crate::search::reveal_label;

/// Width of one termtree level prefix (`├── `).
const LEVEL_INDENT: u32 = 4;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Optional search terms; without them the whole tree is printed
    pub query: Vec<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print library names only
    #[arg(long)]
    pub libraries_only: bool,
}

#[derive(Debug, Serialize)]
struct NodeOutput {
    name: String,
    kind: NodeKind,
    description: String,
    score: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeOutput>,
}

pub fn execute(args: TreeArgs, settings: &Settings) -> Result<()> {
    let mut adapter = load_adapter(settings)?;
    adapter.set_indent(LEVEL_INDENT);
    let expansion = adapter.update_search_string(&args.query.join(" "));

    match args.format {
        OutputFormat::Text => {
            let revealed = expansion.map(|e| e.node);
            print!("{}", build_tree(&adapter, revealed, !args.libraries_only));
            if let Some(expansion) = expansion {
                println!(
                    "{} {} ({:?})",
                    "Reveal:".dimmed(),
                    reveal_label(&adapter, expansion.node).green(),
                    expansion.rule
                );
            }
        }
        OutputFormat::Json => {
            let nodes: Vec<NodeOutput> = adapter
                .children(NodeId::ROOT)
                .into_iter()
                .map(|lib| node_output(&adapter, lib, !args.libraries_only))
                .collect();
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
    }
    Ok(())
}

fn node_output(adapter: &SymbolTreeAdapter, id: NodeId, symbols: bool) -> NodeOutput {
    let node = adapter.tree().node(id);
    let children = if symbols || node.kind() != NodeKind::Library {
        adapter
            .children(id)
            .into_iter()
            .map(|child| node_output(adapter, child, symbols))
            .collect()
    } else {
        Vec::new()
    };
    NodeOutput {
        name: node.name.clone(),
        kind: node.kind(),
        description: node.description.clone(),
        score: node.score,
        children,
    }
}

fn build_tree(
    adapter: &SymbolTreeAdapter,
    revealed: Option<NodeId>,
    symbols: bool,
) -> Tree<String> {
    let part_width = adapter.column_width(Column::Part, &MonospaceMeasure::default());

    fn build(
        adapter: &SymbolTreeAdapter,
        id: NodeId,
        part_width: u32,
        revealed: Option<NodeId>,
        symbols: bool,
    ) -> Tree<String> {
        let expand = symbols || adapter.type_for(id) != Some(NodeKind::Library);
        let leaves: Vec<Tree<String>> = if expand {
            adapter
                .children(id)
                .into_iter()
                .map(|child| build(adapter, child, part_width, revealed, symbols))
                .collect()
        } else {
            Vec::new()
        };
        Tree::new(label(adapter, id, part_width, revealed == Some(id))).with_leaves(leaves)
    }

    let leaves: Vec<Tree<String>> = adapter
        .children(NodeId::ROOT)
        .into_iter()
        .map(|lib| build(adapter, lib, part_width, revealed, symbols))
        .collect();
    let title = format!(
        "{} symbols in {} libraries",
        adapter.components_count(),
        adapter.libraries_count()
    );
    Tree::new(title.bold().to_string()).with_leaves(leaves)
}

/// Name padded so descriptions line up across levels.
fn label(adapter: &SymbolTreeAdapter, id: NodeId, part_width: u32, revealed: bool) -> String {
    let depth = adapter.tree().depth(id) as u32;
    let pad = part_width.saturating_sub(LEVEL_INDENT * (depth + 1)) as usize;
    let description = adapter.value(id, 1);
    let name = if description.is_empty() {
        adapter.value(id, 0)
    } else {
        format!("{:<pad$}", adapter.value(id, 0))
    };

    let name = match adapter.type_for(id) {
        _ if revealed => name.green().bold(),
        Some(NodeKind::Library) => name.blue().bold(),
        _ if adapter.attr(id, 0).italic => name.italic(),
        _ => name.normal(),
    };
    if description.is_empty() {
        name.to_string()
    } else {
        format!("{name} {}", description.dimmed())
    }
}
