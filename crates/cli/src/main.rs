//! bencao - pharmacopeia knowledge-graph pipeline.
//!
//! segment: flat corpus text -> per-herb records (JSON array)
//! extract: records -> fragment log (JSONL), concurrent and resumable
//! import:  fragment log -> Neo4j, then the disconnected-entity cleanup

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extract::DeepSeekClient;
use graph::GraphMerger;
use pipeline::{Dispatcher, FragmentLog};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Debug, Parser)]
#[command(name = "bencao")]
#[command(version, about = "Build a knowledge graph from a pharmacopeia text corpus")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment the raw corpus text into per-herb records
    Segment {
        /// Raw pharmacopeia text file
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the records JSON array
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the concurrent, resumable extraction over segmented records
    Extract {
        /// Records JSON array produced by `segment`
        #[arg(short, long)]
        input: PathBuf,
        /// Append-only fragment log (JSONL); also the resume checkpoint
        #[arg(short, long)]
        output: PathBuf,
        /// Parallel extraction workers
        #[arg(short, long, default_value_t = pipeline::DEFAULT_WORKERS)]
        workers: usize,
    },
    /// Import the fragment log into Neo4j and drop disconnected entities
    Import {
        /// Fragment log produced by `extract`
        #[arg(short, long)]
        input: PathBuf,
        /// Leave disconnected entities in place
        #[arg(long)]
        skip_cleanup: bool,
    },
    /// Entity and relation counts of the persisted graph
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Segment { input, output } => segment(&input, &output).await,
        Command::Extract {
            input,
            output,
            workers,
        } => extract_records(&input, &output, workers).await,
        Command::Import {
            input,
            skip_cleanup,
        } => import(&cli.config, &input, skip_cleanup).await,
        Command::Stats => stats(&cli.config).await,
    }
}

async fn segment(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let records = ingest::segment_file(input).await?;
    ingest::write_records(output, &records).await?;
    println!(
        "Segmented {} records into {}",
        records.len(),
        output.display()
    );
    Ok(())
}

async fn extract_records(input: &PathBuf, output: &PathBuf, workers: usize) -> Result<()> {
    // Fail before any work if the credential is absent.
    let client = DeepSeekClient::from_env()?;

    let records = ingest::load_records(input).await?;
    let total = records.len();

    let done = pipeline::completed_names(output).await?;
    let remaining = pipeline::pending(records, &done);

    if remaining.is_empty() {
        println!("All {} records already extracted, nothing to do.", total);
        return Ok(());
    }
    println!(
        "{} of {} records pending ({} already in the log).",
        remaining.len(),
        total,
        done.len()
    );

    let log = Arc::new(FragmentLog::open(output).await?);
    let summary = Dispatcher::new(Arc::new(client))
        .with_workers(workers)
        .run(remaining, log)
        .await?;

    println!(
        "Extraction finished: {} succeeded, {} failed, {} attempted this run.",
        summary.succeeded, summary.failed, summary.total
    );
    if summary.failed > 0 {
        println!("Failed records stay pending; re-run `extract` to retry them.");
    }
    Ok(())
}

async fn connect(config_path: &PathBuf) -> Result<GraphMerger> {
    let settings = Settings::load(config_path)?;
    let graph = neo4rs::Graph::new(
        settings.neo4j.uri.as_str(),
        settings.neo4j.user.as_str(),
        settings.neo4j.password.as_str(),
    )
    .await
    .with_context(|| format!("Failed to connect to Neo4j at {}", settings.neo4j.uri))?;
    Ok(GraphMerger::new(graph))
}

async fn import(config_path: &PathBuf, input: &PathBuf, skip_cleanup: bool) -> Result<()> {
    let merger = connect(config_path).await?;
    merger.ensure_constraint().await?;

    let summary = merger.import(input).await?;
    println!(
        "Imported {} fragments ({} nodes, {} edges); {} lines failed.",
        summary.fragments, summary.nodes, summary.edges, summary.failed_lines
    );

    if skip_cleanup {
        println!("Cleanup skipped; disconnected entities were kept.");
        return Ok(());
    }

    let deleted = merger.remove_disconnected().await?;
    println!("Removed {} disconnected entities.", deleted);
    Ok(())
}

async fn stats(config_path: &PathBuf) -> Result<()> {
    let merger = connect(config_path).await?;
    let stats = merger.stats().await?;
    println!(
        "Graph contains {} entities and {} relations.",
        stats.entities, stats.relations
    );
    Ok(())
}
