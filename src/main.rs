use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;

use sitegraph::embeddings::OpenAIEmbedder;
use sitegraph::{config::Config, graph, index, pages};

#[derive(Parser)]
#[command(name = "sitegraph")]
#[command(about = "Structural document graph engine over a static HTML site")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the site's HTML pages and write the node-link graph JSON
    Build,
    /// Embed the graph's context documents and write the retrieval index
    Embed,
    /// Rank indexed nodes against a natural-language query
    Query {
        /// Query text
        query: String,
        /// Number of results (defaults to search.default_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Print node and edge counts for the persisted graph
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Build => build(&config),
        Command::Embed => embed(&config).await,
        Command::Query { query, top_k } => {
            let k = top_k.unwrap_or(config.search.default_k);
            run_query(&config, &query, k).await
        }
        Command::Stats => stats(&config),
    }
}

fn build(config: &Config) -> Result<()> {
    let documents = pages::load_site(config.site_root())
        .with_context(|| format!("Failed to load site from {}", config.site_root().display()))?;
    if documents.is_empty() {
        anyhow::bail!("No HTML pages found under {}", config.site_root().display());
    }

    let graph = graph::build_site_graph(&documents);
    log::info!(
        "Built graph: {} pages, {} nodes, {} edges",
        documents.len(),
        graph.node_count(),
        graph.edge_count()
    );

    graph::save_graph(config.graph_path(), &graph)?;
    println!(
        "Graph written to {} ({} nodes, {} edges)",
        config.graph_path().display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}

async fn embed(config: &Config) -> Result<()> {
    let graph = graph::load_graph(config.graph_path())
        .with_context(|| format!("Failed to load graph from {}", config.graph_path().display()))?;

    let embedder = OpenAIEmbedder::from_config(config)?;
    let records = index::build_index(&graph, &embedder).await?;
    index::save_index(config.index_path(), &records)?;

    println!(
        "Indexed {} of {} nodes into {}",
        records.len(),
        graph.node_count(),
        config.index_path().display()
    );
    Ok(())
}

async fn run_query(config: &Config, query: &str, top_k: usize) -> Result<()> {
    let embedder = OpenAIEmbedder::from_config(config)?;
    let matches = index::query(config.index_path(), &embedder, query, top_k).await?;

    if matches.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }

    println!("Top {} results for '{}':\n", matches.len(), query);
    for m in &matches {
        let location = match (&m.metadata.page_name, &m.metadata.tag) {
            (Some(page), Some(tag)) => format!("{} <{}>", page, tag),
            (Some(page), None) => page.clone(),
            _ => String::new(),
        };
        println!(
            "{}. [{:.4} | norm {:.2}] {} ({}) {}",
            m.rank, m.score, m.norm_score, m.node_id, m.metadata.node_type, location
        );
        println!("   {}\n", preview(&m.text, 200));
    }
    Ok(())
}

fn stats(config: &Config) -> Result<()> {
    let graph = graph::load_graph(config.graph_path())
        .with_context(|| format!("Failed to load graph from {}", config.graph_path().display()))?;

    let mut node_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *node_counts.entry(node.kind.type_name()).or_default() += 1;
    }
    let mut edge_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for edge in graph.edges() {
        *edge_counts.entry(edge.relation.as_str()).or_default() += 1;
    }

    println!("Graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());
    println!("\nNodes by type:");
    for (kind, count) in &node_counts {
        println!("  {:<18} {}", kind, count);
    }
    println!("\nEdges by relation:");
    for (relation, count) in &edge_counts {
        println!("  {:<24} {}", relation, count);
    }
    Ok(())
}

/// First `max_chars` characters of `text` with newlines flattened, for
/// one-line result previews.
fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let truncated: String = flat.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
