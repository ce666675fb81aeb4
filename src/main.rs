mod config;
mod project;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use codeseek_embed::any::AnyEmbedder;
use codeseek_embed::ollama::OllamaEmbedder;
use codeseek_embed::openai::OpenAiEmbedder;
use codeseek_index::{CodeIndexer, CodeRetriever, SearchResult};
use codeseek_store::{InMemoryVectorIndex, VectorIndex};

use crate::config::{Config, EmbeddingBackend, StoreBackend};
use crate::project::{IndexReport, index_project};

#[derive(Debug, Parser)]
#[command(name = "codeseek", version, about = "Semantic search over source trees")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "codeseek.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chunk, embed and store every recognized source file under ROOT.
    Index { root: PathBuf },
    /// Rank stored chunks against a query.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        language: Option<String>,
        /// Index this tree before searching.
        #[arg(long)]
        index: Option<PathBuf>,
        /// Print results as JSON lines.
        #[arg(long)]
        json: bool,
    },
    /// Print a token-budgeted context block for a query.
    Context {
        query: String,
        #[arg(long)]
        max_tokens: Option<usize>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    tracing::debug!(?config, "configuration loaded");

    let provider = Arc::new(create_provider(&config)?);
    let store = create_store(&config)?;

    match cli.command {
        Command::Index { root } => {
            let report = run_index(&config, &store, &provider, &root).await;
            println!("{}", report_summary(&report));
            check_report(&report)?;
        }
        Command::Search {
            query,
            limit,
            language,
            index,
            json,
        } => {
            if let Some(root) = index {
                let report = run_index(&config, &store, &provider, &root).await;
                eprintln!("{}", report_summary(&report));
                check_report(&report)?;
            }
            let retriever = CodeRetriever::new(store, provider, config.retrieval)?;
            let limit = limit.unwrap_or(retriever.config().default_limit);
            let results = retriever
                .search(&query, limit, language.as_deref())
                .await
                .context("search failed")?;
            print_results(&results, json)?;
        }
        Command::Context {
            query,
            max_tokens,
            language,
            index,
        } => {
            if let Some(root) = index {
                let report = run_index(&config, &store, &provider, &root).await;
                eprintln!("{}", report_summary(&report));
                check_report(&report)?;
            }
            let retriever = CodeRetriever::new(store, provider, config.retrieval)?;
            let max_tokens = max_tokens.unwrap_or(retriever.config().default_max_tokens);
            let context = retriever
                .build_context(&query, max_tokens, language.as_deref())
                .await
                .context("context assembly failed")?;
            println!("{context}");
        }
    }

    Ok(())
}

fn create_provider(config: &Config) -> anyhow::Result<AnyEmbedder> {
    let embedding = &config.embedding;
    tracing::info!(
        provider = %embedding.provider,
        model = %embedding.model,
        "embedding provider selected"
    );
    match embedding.provider {
        EmbeddingBackend::Ollama => Ok(AnyEmbedder::Ollama(OllamaEmbedder::new(
            &embedding.base_url,
            embedding.model.clone(),
        ))),
        EmbeddingBackend::OpenAi => {
            let Some(api_key) = embedding.api_key.clone() else {
                bail!("openai provider requires CODESEEK_OPENAI_API_KEY");
            };
            Ok(AnyEmbedder::OpenAi(
                OpenAiEmbedder::new(api_key, embedding.base_url.clone(), embedding.model.clone())
                    .with_max_retries(embedding.max_retries)
                    .with_timeout(Duration::from_secs(embedding.timeout_secs)),
            ))
        }
    }
}

fn create_store(config: &Config) -> anyhow::Result<Arc<dyn VectorIndex>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryVectorIndex::new())),
        #[cfg(feature = "qdrant")]
        StoreBackend::Qdrant => {
            let store = codeseek_store::QdrantVectorIndex::new(
                &config.store.qdrant_url,
                config.store.collection.clone(),
            )
            .context("failed to connect to Qdrant")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "qdrant"))]
        StoreBackend::Qdrant => bail!("qdrant backend requires the `qdrant` feature"),
    }
}

async fn run_index(
    config: &Config,
    store: &Arc<dyn VectorIndex>,
    provider: &Arc<AnyEmbedder>,
    root: &Path,
) -> IndexReport {
    let indexer = CodeIndexer::new(Arc::clone(store), Arc::clone(provider), config.chunking);
    index_project(&indexer, root).await
}

fn report_summary(report: &IndexReport) -> String {
    format!(
        "scanned {} files, indexed {} ({} chunks) in {} ms",
        report.files_scanned, report.files_indexed, report.chunks_created, report.duration_ms
    )
}

/// Print per-file errors to stderr and fail when every scanned file errored.
fn check_report(report: &IndexReport) -> anyhow::Result<()> {
    for error in &report.errors {
        eprintln!("error: {error}");
    }
    if report.files_scanned > 0 && report.files_indexed == 0 && !report.errors.is_empty() {
        bail!(
            "no files were indexed ({} errors, first: {})",
            report.errors.len(),
            report.errors[0]
        );
    }
    if !report.errors.is_empty() {
        tracing::warn!(errors = report.errors.len(), "some files failed to index");
    }
    Ok(())
}

fn print_results(results: &[SearchResult], json: bool) -> anyhow::Result<()> {
    if results.is_empty() {
        eprintln!("no results");
        return Ok(());
    }
    for result in results {
        let chunk = &result.chunk;
        if json {
            let line = serde_json::json!({
                "file_path": chunk.file_path,
                "start_line": chunk.start_line,
                "end_line": chunk.end_line,
                "language": chunk.language,
                "score": result.score,
                "relevance": result.relevance_percentage(),
                "content": chunk.content,
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!(
                "{:>6.2}%  {}:{}-{}",
                result.relevance_percentage(),
                chunk.file_path,
                chunk.start_line,
                chunk.end_line
            );
        }
    }
    Ok(())
}
