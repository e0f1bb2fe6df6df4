use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docs_answer::Result;
use docs_answer::commands::{ask, ingest, show_status};
use docs_answer::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "docs-answer")]
#[command(about = "Answer questions from your own documents with retrieval-augmented generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure embedding, generation and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index files or directories (txt, md, csv, html, pdf, docx)
    Ingest {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask a question about the indexed documents
    Ask {
        /// The question, words may be given unquoted
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Print the answer as a JSON payload
        #[arg(long)]
        json: bool,
    },
    /// Show what is in the index
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { paths } => {
            ingest(&paths).await?;
        }
        Commands::Ask { question, json } => {
            ask(&question.join(" "), json).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
