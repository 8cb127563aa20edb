//! Schema Forest CLI
//!
//! Builds a forest from a discovery document and queries it.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_forest::{DefinitionIndex, Forest, ForestConfig, RefGraph};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-forest")]
#[command(about = "Materialize and query Kubernetes discovery schema trees")]
struct Cli {
    /// Config file (defaults to forest.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Discovery document (OpenAPI v2 JSON); "-" reads stdin
    #[arg(short, long)]
    document: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every root with its parsed group/version/kind
    List,

    /// Find the root for an apiVersion and kind
    Lookup {
        #[arg(short, long)]
        api_version: String,
        #[arg(short, long)]
        kind: String,
    },

    /// Find a root by its label
    Label {
        label: String,
    },

    /// Fuzzy search root names
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write the forest as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report reference cycles and dangling refs
    Cycles,

    /// Show snapshot hash, build time and counts
    Summary,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn read_document(cli_path: Option<PathBuf>, config: &ForestConfig) -> anyhow::Result<Vec<u8>> {
    let path = match cli_path.or_else(|| config.document_path()) {
        Some(path) => path,
        None => bail!("no discovery document given; pass --document or set source.document"),
    };

    if path.as_os_str() == "-" {
        let mut raw = Vec::new();
        std::io::stdin().read_to_end(&mut raw)?;
        return Ok(raw);
    }

    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ForestConfig::load_from(cli.config.as_deref())?;
    let raw = read_document(cli.document, &config)?;

    let build = || Forest::build(&raw, &config.build);

    match cli.command {
        Commands::List => {
            let forest = build()?;
            forest.log_roots();
            for root in forest.list_roots() {
                println!(
                    "{}\t{}\t[{},{},{}]",
                    root.id, root.label, root.group, root.version, root.kind
                );
            }
        }
        Commands::Lookup { api_version, kind } => {
            let forest = build()?;
            match forest.lookup_gvk(&api_version, &kind) {
                Some(hit) => {
                    println!("matched by {}: {}", hit.tier, hit.node.id);
                    print!("{}", hit.node.outline());
                }
                None => bail!("no root for apiVersion={} kind={}", api_version, kind),
            }
        }
        Commands::Label { label } => {
            let forest = build()?;
            match forest.fetch_by_label(&label) {
                Some(node) => print!("{}", node.outline()),
                None => bail!("no root labelled {}", label),
            }
        }
        Commands::Search { query, limit } => {
            let forest = build()?;
            let limit = limit.unwrap_or(config.search.limit);
            for hit in forest.search(&query, limit) {
                println!("{:>5}  {}\t{}", hit.score, hit.label, hit.id);
            }
        }
        Commands::Export { output } => {
            let forest = build()?;
            let json = forest.to_json(config.export.output_format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported {} roots to {:?}", forest.len(), path);
                }
                None => println!("{}", json),
            }
        }
        Commands::Cycles => {
            // The ref graph only needs the index, not a built forest
            let index = DefinitionIndex::parse_with(&raw, config.build.strict)?;
            let graph = RefGraph::from_index(&index);
            println!("{} definitions, {} refs", graph.node_count(), graph.edge_count());
            for group in graph.cycles() {
                println!("cycle: {}", group.join(" <-> "));
            }
            for missing in graph.missing_targets() {
                println!("missing: {} -> {}", missing.from, missing.target);
            }
        }
        Commands::Summary => {
            let summary = build()?.summary();
            if let Some(snapshot) = &summary.snapshot {
                println!("snapshot: {}", snapshot);
            }
            println!("built at: {}", summary.built_at.to_rfc3339());
            println!("roots:    {}", summary.roots);
            println!("nodes:    {}", summary.nodes);
            println!("skipped:  {}", summary.skipped);
        }
    }

    Ok(())
}
