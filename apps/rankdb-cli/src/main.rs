//! rankdb command line.
//!
//! ```bash
//! rankdb ingest --catalog data/products.tsv
//! rankdb ingest --resume
//! rankdb query "oak desk lamp" --rerank 5
//! rankdb query "oak desk lamp" --ids-only
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rankdb_core::catalog::load_delimited;
use rankdb_core::config::{current_env, resolve_with_base, Config, Settings};
use rankdb_core::{Document, Error};
use rankdb_hybrid::{ArtifactLayout, HybridEngine, IndexingPipeline};
use rankdb_vector::embed_provider::build_provider;

/// Hybrid lexical + dense retrieval over a delimited catalog.
#[derive(Parser, Debug)]
#[command(name = "rankdb", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the lexical model, embed the catalog and write every artifact
    Ingest {
        /// Catalog file (default: `catalog.path` from config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Continue from a matching embedding checkpoint instead of starting over
        #[arg(long)]
        resume: bool,
    },
    /// Rank the catalog against a query
    Query {
        text: String,

        /// Rerank the retrieved candidates down to N results
        #[arg(long, value_name = "N")]
        rerank: Option<usize>,

        /// Print identifiers and scores without catalog metadata
        #[arg(long)]
        ids_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load()?;
    let settings = config.settings()?;
    let cwd = std::env::current_dir()?;
    let layout = ArtifactLayout::from_settings(&settings.artifacts, &cwd);

    match cli.command {
        Command::Ingest { catalog, resume } => {
            let path = catalog.unwrap_or_else(|| resolve_with_base(&cwd, &settings.catalog.path));
            let docs = load_catalog(&settings, &path)?;
            ingest(&settings, layout, &docs, resume).await
        }
        Command::Query { text, rerank, ids_only } => {
            let path = resolve_with_base(&cwd, &settings.catalog.path);
            let docs = load_catalog(&settings, &path)?;
            query(&settings, &layout, docs, &text, rerank, ids_only).await
        }
    }
}

fn init_logging() {
    let default_level = if current_env() == "dev" { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_catalog(settings: &Settings, path: &Path) -> Result<Vec<Document>> {
    let delimiter = u8::try_from(settings.catalog.delimiter).map_err(|_| {
        Error::InvalidConfig(format!(
            "catalog.delimiter must be a single byte, got {:?}",
            settings.catalog.delimiter
        ))
    })?;
    let docs = load_delimited(path, &settings.catalog.id_column, delimiter)
        .with_context(|| format!("loading catalog {}", path.display()))?;
    info!(path = %path.display(), documents = docs.len(), "catalog loaded");
    Ok(docs)
}

async fn ingest(
    settings: &Settings,
    layout: ArtifactLayout,
    docs: &[Document],
    resume: bool,
) -> Result<()> {
    let provider = build_provider(&settings.dense)?;
    let report = IndexingPipeline::from_settings(settings, provider, layout)
        .with_resume(resume)
        .with_progress(true)
        .run(docs)
        .await?;
    println!(
        "indexed {} documents ({} terms, {} batches, embedder {})",
        report.documents, report.vocabulary, report.batches, report.embedder_id
    );
    if report.resumed_from > 0 {
        println!("resumed from position {}", report.resumed_from);
    }
    Ok(())
}

async fn query(
    settings: &Settings,
    layout: &ArtifactLayout,
    docs: Vec<Document>,
    text: &str,
    rerank: Option<usize>,
    ids_only: bool,
) -> Result<()> {
    let engine = HybridEngine::open(settings, layout, docs).await?;
    let hits = match rerank {
        Some(top_n) => engine.search(text, top_n).await,
        None => engine.retrieve_ids(text).await,
    };
    if hits.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!("{:>2}. {:<16} {:>8.4}  [{:?}]", rank + 1, hit.id, hit.score, hit.source);
        if ids_only {
            continue;
        }
        if let Some(doc) = engine.document(&hit.id) {
            for (name, value) in &doc.fields {
                if !value.is_empty() {
                    println!("      {name}: {value}");
                }
            }
        }
    }
    Ok(())
}
