//! `lsa-search`: build a semantic index over a local corpus, then serve it
//! over HTTP or answer a single query from the command line.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lsa_adaptor_web::{SearchResponse, SearchServer, WebConfig};
use lsa_core::utils::logger::LOG_LEVEL_ENV;
use lsa_core::{
    init_logging, load_corpus, load_env, load_env_from_path, SearchConfig, SemanticIndex, StopwordSet,
    DEFAULT_COMPONENTS, DEFAULT_SEED, DEFAULT_TOP_K,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lsa-search")]
#[command(about = "Latent semantic search over a local document corpus", long_about = None)]
struct Cli {
    #[arg(long, global = true, env = "LSA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Extra env file read before `.env`; variables already set win
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the index and serve the search form and JSON endpoint
    Serve {
        #[command(flatten)]
        index: IndexArgs,

        #[arg(long, env = "LSA_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "LSA_PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Build the index and print the best matches for one query
    Query {
        #[command(flatten)]
        index: IndexArgs,

        /// Query text
        text: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct IndexArgs {
    /// Directory, `.json` array or line-per-document text file
    #[arg(long, env = "LSA_CORPUS_PATH")]
    corpus: PathBuf,

    /// Stopword file (one word per line); the built-in English list otherwise
    #[arg(long, env = "LSA_STOPWORDS_PATH")]
    stopwords: Option<PathBuf>,

    /// Semantic dimensions kept by the truncated SVD
    #[arg(long, env = "LSA_COMPONENTS", default_value_t = DEFAULT_COMPONENTS)]
    components: usize,

    #[arg(long, env = "LSA_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    #[arg(long, env = "LSA_SEED", default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl IndexArgs {
    fn search_config(&self) -> SearchConfig {
        SearchConfig::from_env()
            .with_components(self.components)
            .with_top_k(self.top_k)
            .with_seed(self.seed)
    }
}

fn build_index(args: &IndexArgs) -> anyhow::Result<SemanticIndex> {
    let corpus = load_corpus(&args.corpus)
        .with_context(|| format!("loading corpus from {}", args.corpus.display()))?;
    let stopwords = match &args.stopwords {
        Some(path) => StopwordSet::from_file(path)
            .with_context(|| format!("loading stopwords from {}", path.display()))?,
        None => StopwordSet::english(),
    };
    let index = SemanticIndex::build(corpus, stopwords, &args.search_config())
        .context("building semantic index")?;
    Ok(index)
}

async fn build_index_blocking(args: IndexArgs) -> anyhow::Result<SemanticIndex> {
    tokio::task::spawn_blocking(move || build_index(&args))
        .await
        .context("index build task panicked")?
}

/// `--env-file` has to be applied before clap resolves the `env` fallbacks
fn env_file_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Some(path) = env_file_from_args(std::env::args().skip(1)) {
        load_env_from_path(&path)
            .with_context(|| format!("loading env file {}", path.display()))?;
    }
    load_env()?;
    let cli = Cli::parse();
    std::env::set_var(LOG_LEVEL_ENV, &cli.log_level);
    init_logging();
    if let Some(path) = &cli.env_file {
        info!("Environment file: {}", path.display());
    }

    match cli.command {
        Command::Serve { index, host, port } => {
            let index = Arc::new(build_index_blocking(index).await?);
            let stats = index.stats();
            info!(
                "Index ready: {} documents, {} terms, {} components",
                stats.documents, stats.vocabulary_size, stats.components
            );
            let server = SearchServer::new(WebConfig { host, port }, index);
            server.start().await?;
        }
        Command::Query { index, text, json } => {
            let index = build_index_blocking(index).await?;
            let hits = index.search_default(&text)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&SearchResponse::from(hits))?);
            } else if hits.is_empty() {
                println!("No results");
            } else {
                for (rank, hit) in hits.iter().enumerate() {
                    println!(
                        "{:>3}. [{}] {:.4}  {}",
                        rank + 1,
                        hit.index,
                        hit.rounded_score(),
                        snippet(&hit.document, 120)
                    );
                }
            }
        }
    }

    Ok(())
}

/// First `max_chars` characters of `text` on a single line
fn snippet(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut cut: String = flat.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}
