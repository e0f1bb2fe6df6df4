use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use console::style;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::{IndexService, VECTORS_FILE};
use crate::embeddings::{Embedder, OllamaClient};
use crate::generation;
use crate::indexer::Indexer;
use crate::rag::{AnswerOrchestrator, Retriever};

fn load_services(config: &Config) -> Result<(Arc<IndexService>, Arc<dyn Embedder>)> {
    let embedder: Arc<dyn Embedder> = Arc::new(
        OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?,
    );
    let index = Arc::new(IndexService::from_config(config));
    Ok((index, embedder))
}

/// Load, chunk, embed and index the given files and directories
#[inline]
pub async fn ingest(paths: &[PathBuf]) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let (index, embedder) = load_services(&config)?;

    info!("Ingesting into {}", index.dir().display());

    let report = Indexer::from_config(&config, index, embedder)
        .with_progress(true)
        .ingest(paths)
        .await?;

    println!(
        "{} {} files, {} chunks",
        style("Indexed").green().bold(),
        report.files_indexed,
        report.chunks_added
    );

    if !report.skipped.is_empty() {
        println!("Skipped {} files:", report.skipped.len());
        for path in &report.skipped {
            println!("  {}", style(path.display()).dim());
        }
    }

    if !report.failures.is_empty() {
        println!("{} {} files:", style("Failed").red().bold(), report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.reason);
        }
    }

    match report.generation {
        Some(generation) => println!("Index generation: {}", generation),
        None => println!("{}", style("Index unchanged").yellow()),
    }

    Ok(())
}

/// Answer a question from the indexed documents
#[inline]
pub async fn ask(question: &str, json: bool) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let (index, embedder) = load_services(&config)?;
    let generator = generation::from_config(&config)?;

    let orchestrator =
        AnswerOrchestrator::from_config(&config, Retriever::new(index, embedder), generator);
    let outcome = orchestrator.answer(question).await;

    if json {
        let payload = serde_json::to_string_pretty(&outcome.to_payload())
            .context("Failed to serialize answer")?;
        println!("{}", payload);
        return Ok(());
    }

    let answer = outcome.into_result()?;
    println!("{}", answer);
    Ok(())
}

/// Summarize what is in the index
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let index = IndexService::from_config(&config);

    println!("{}", style("📊 Index Status").bold().cyan());
    println!();
    println!("Location: {}", style(index.dir().display()).cyan());
    println!("Embedding model: {}", style(index.model()).cyan());

    let snapshot = match index.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Index could not be loaded: {}", e);
            println!("{} {}", style("⚠️  Index unavailable:").red().bold(), e);
            println!("Re-run 'docs-answer ingest' to rebuild it.");
            return Ok(());
        }
    };

    if snapshot.is_empty() {
        println!("{}", style("Index is empty").yellow());
        println!("Use 'docs-answer ingest <path>' to add documents.");
        return Ok(());
    }

    let sources: BTreeSet<&str> = snapshot
        .store()
        .iter()
        .map(|chunk| chunk.source_file.as_str())
        .collect();

    println!("Generation: {}", snapshot.generation());
    println!("Dimension: {}", snapshot.index().dimension());
    println!("Chunks: {}", snapshot.len());
    println!("Source files: {}", sources.len());

    if let Ok(modified) = std::fs::metadata(index.dir().join(VECTORS_FILE))
        .and_then(|meta| meta.modified())
    {
        let modified: DateTime<Local> = modified.into();
        println!("Last updated: {}", modified.format("%Y-%m-%d %H:%M:%S"));
    }

    println!();
    for source in sources {
        println!("  📄 {}", source);
    }

    Ok(())
}
