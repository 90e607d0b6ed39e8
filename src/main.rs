use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use walkdir::WalkDir;

use nb_rationale::config::GenConfig;
use nb_rationale::engine::{trace, RewriteEngine};
use nb_rationale::errors::ExtractError;
use nb_rationale::llm::LlmClient;
use nb_rationale::notebook::Notebook;
use nb_rationale::report::RunSummary;

#[derive(Parser)]
#[command(
    name = "nb-rationale",
    version,
    about = "Regenerates assistant reasoning cells in recorded agent-trajectory notebooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite reasoning cells in a notebook file or directory tree
    Rewrite {
        /// A single .ipynb file, or a directory searched recursively
        path: PathBuf,
        /// Model identifier served by the generation endpoint
        #[arg(long)]
        model: Option<String>,
        /// Base URL of the OpenAI-compatible endpoint
        #[arg(long)]
        base_url: Option<String>,
        /// Cap on generated text size
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Trim tool results beyond this many chars when building prompts
        #[arg(long)]
        truncate_at: Option<usize>,
        /// Build prompts but never call the service or write files
        #[arg(long)]
        dry_run: bool,
    },
    /// Report notebook eligibility without contacting the service
    Check {
        /// A single .ipynb file, or a directory searched recursively
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Command::Rewrite {
            path,
            model,
            base_url,
            max_tokens,
            temperature,
            timeout_secs,
            truncate_at,
            dry_run,
        } => {
            let mut config = GenConfig::from_env();
            if let Some(v) = model {
                config.model = v;
            }
            if let Some(v) = base_url {
                config.base_url = v;
            }
            if let Some(v) = max_tokens {
                config.max_tokens = v;
            }
            if let Some(v) = temperature {
                config.temperature = v;
            }
            if let Some(v) = timeout_secs {
                config.timeout = Duration::from_secs(v);
            }
            if let Some(v) = truncate_at {
                config.truncate_at = v;
            }
            run_rewrite(&path, config, dry_run).await
        }
        Command::Check { path } => run_check(&path),
    }
}

async fn run_rewrite(path: &Path, config: GenConfig, dry_run: bool) -> anyhow::Result<()> {
    let files = discover_notebooks(path)?;
    if files.is_empty() {
        info!(path = %path.display(), "no .ipynb files found");
        return Ok(());
    }
    info!(count = files.len(), model = %config.model, "starting rewrite run");

    let truncate_at = config.truncate_at;
    let llm = LlmClient::new(config)?;
    let engine = RewriteEngine::new(llm, truncate_at, dry_run);

    let mut summary = RunSummary::new();
    for file in &files {
        let outcome = engine.process(file).await;
        println!("{}: {}", file.display(), outcome);
        summary.record(&outcome);
    }
    println!("{}", summary);

    if summary.any_failed() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(path: &Path) -> anyhow::Result<()> {
    let files = discover_notebooks(path)?;
    if files.is_empty() {
        info!(path = %path.display(), "no .ipynb files found");
        return Ok(());
    }

    let (mut eligible, mut would_skip, mut malformed) = (0usize, 0usize, 0usize);
    for file in &files {
        match Notebook::load(file) {
            Err(e) => {
                malformed += 1;
                println!("{}: malformed ({})", file.display(), e);
            }
            Ok(nb) => match trace::extract(&nb) {
                Ok(t) => {
                    eligible += 1;
                    println!("{}: eligible ({} steps)", file.display(), t.steps.len());
                }
                Err(e @ (ExtractError::EmptyTrace | ExtractError::NoReasoningCell)) => {
                    would_skip += 1;
                    println!("{}: would skip ({})", file.display(), e);
                }
                Err(e @ ExtractError::NoInstruction) => {
                    malformed += 1;
                    println!("{}: malformed ({})", file.display(), e);
                }
            },
        }
    }
    println!(
        "{} eligible, {} would skip, {} malformed",
        eligible, would_skip, malformed
    );

    if malformed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// A file path is taken as-is; a directory is walked recursively for
/// `.ipynb` files, hidden entries excluded. Sorted for a stable
/// processing order.
fn discover_notebooks(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("path not found: {}", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.with_context(|| format!("walking {}", path.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |ext| ext == "ipynb")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
