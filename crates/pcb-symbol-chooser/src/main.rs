use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod config;
mod libs;
mod load;
mod search;
mod tree;

#[derive(Parser)]
#[command(name = "pcb-symbols")]
#[command(about = "Search and browse KiCad symbol libraries", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where libraries come from and how they are loaded.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Settings file (defaults to ./pcb-symbols.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Symbol library table to load [default: newest
    /// <config dir>/kicad/<version>/sym-lib-table, else <config dir>/kicad/sym-lib-table]
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "library_dir")]
    pub lib_table: Option<PathBuf>,

    /// Load every .kicad_sym file in this directory instead of a table
    #[arg(long, global = true, value_name = "DIR")]
    pub library_dir: Option<PathBuf>,

    /// Only load power symbols
    #[arg(long, global = true)]
    pub power: bool,

    /// Do not create unit nodes for multi-unit symbols
    #[arg(long, global = true)]
    pub no_units: bool,

    /// Symbol to reveal when nothing matches, as Library:Name
    #[arg(long, global = true, value_name = "LIB_ID")]
    pub preselect: Option<String>,

    /// Unit of the preselected symbol (1 = A)
    #[arg(long, global = true, value_name = "UNIT")]
    pub unit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Text,
    /// JSON output
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank symbols against a search string
    #[command(alias = "s")]
    Search(search::SearchArgs),

    /// Print the filtered library tree
    #[command(alias = "t")]
    Tree(tree::TreeArgs),

    /// List the configured libraries
    Libs(libs::LibsArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --debug raises the default level; RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    let settings = config::Config::load(cli.source.config.as_deref())?.resolve(&cli.source)?;
    log::debug!("using {settings:?}");

    match cli.command {
        Commands::Search(args) => search::execute(args, &settings),
        Commands::Tree(args) => tree::execute(args, &settings),
        Commands::Libs(args) => libs::execute(args, &settings),
    }
}
