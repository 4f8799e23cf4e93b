//! Environment file generator for lsa-search
//!
//! Writes a `.env` with every `LSA_*` setting the index builder, web server
//! and CLI read, sized for the chosen corpus profile.

use clap::{Parser, ValueEnum};
use rand::Rng;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output file path
    #[arg(short, long, default_value = ".env")]
    output: PathBuf,

    /// Corpus size profile
    #[arg(short, long, value_enum, default_value = "medium")]
    profile: CorpusProfile,

    /// Force overwrite if file exists
    #[arg(short, long)]
    force: bool,

    /// Corpus location (directory, .json array or line-per-document file)
    #[arg(long, default_value = "./corpus")]
    corpus: String,

    /// Stopword file; the built-in English list is used when omitted
    #[arg(long)]
    stopwords: Option<String>,

    /// Projector seed (a fixed seed keeps rankings reproducible across restarts)
    #[arg(long, conflicts_with = "random_seed")]
    seed: Option<u64>,

    /// Draw a fresh projector seed
    #[arg(long)]
    random_seed: bool,

    /// Listen on all interfaces instead of loopback
    #[arg(long)]
    public: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CorpusProfile {
    /// Up to a few thousand short documents
    Small,
    /// Tens of thousands of documents (newsgroup sized)
    Medium,
    /// Large collections; more dimensions, fewer power iterations
    Large,
}

struct ProfileSettings {
    components: usize,
    power_iterations: usize,
    oversamples: usize,
}

impl CorpusProfile {
    fn settings(self) -> ProfileSettings {
        match self {
            CorpusProfile::Small => ProfileSettings {
                components: 50,
                power_iterations: 7,
                oversamples: 10,
            },
            CorpusProfile::Medium => ProfileSettings {
                components: 100,
                power_iterations: 5,
                oversamples: 10,
            },
            CorpusProfile::Large => ProfileSettings {
                components: 300,
                power_iterations: 4,
                oversamples: 20,
            },
        }
    }
}

fn resolve_seed(cli: &Cli) -> u64 {
    if cli.random_seed {
        rand::thread_rng().gen()
    } else {
        cli.seed.unwrap_or(42)
    }
}

fn generate_env_content(cli: &Cli, seed: u64) -> String {
    let settings = cli.profile.settings();
    let host = if cli.public { "0.0.0.0" } else { "127.0.0.1" };
    let stopwords = match &cli.stopwords {
        Some(path) => format!("LSA_STOPWORDS_PATH={}", path),
        None => "# LSA_STOPWORDS_PATH=./stopwords.txt".to_string(),
    };

    format!(
        "# ========================================\n\
         # lsa-search - Environment Configuration\n\
         # ========================================\n\
         # Generated: {}\n\
         # Profile: {:?}\n\
         \n\
         # Corpus\n\
         LSA_CORPUS_PATH={}\n\
         {}\n\
         LSA_MIN_TOKEN_LEN=2\n\
         \n\
         # Semantic projection\n\
         LSA_COMPONENTS={}\n\
         LSA_POWER_ITERATIONS={}\n\
         LSA_OVERSAMPLES={}\n\
         LSA_SEED={}\n\
         \n\
         # Ranking\n\
         LSA_TOP_K=5\n\
         \n\
         # Server Configuration\n\
         LSA_HOST={}\n\
         LSA_PORT=5000\n\
         \n\
         # Logging Configuration\n\
         RUST_LOG=info,lsa_core=debug\n\
         LSA_LOG_LEVEL=info\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        cli.profile,
        cli.corpus,
        stopwords,
        settings.components,
        settings.power_iterations,
        settings.oversamples,
        seed,
        host,
    )
}

fn main() {
    let cli = Cli::parse();

    if cli.output.exists() && !cli.force {
        eprintln!("Error: File {:?} already exists!", cli.output);
        eprintln!("   Use --force to overwrite");
        std::process::exit(1);
    }

    println!("lsa-search configuration generator");
    println!();

    let seed = resolve_seed(&cli);
    println!("Generating configuration for the {:?} profile (seed {})...", cli.profile, seed);
    let content = generate_env_content(&cli, seed);

    match fs::write(&cli.output, content) {
        Ok(_) => {
            println!("Configuration written to: {:?}", cli.output);
        }
        Err(e) => {
            eprintln!("Failed to write file: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("Next steps:");
    println!("   1. Point LSA_CORPUS_PATH at your documents");
    println!("   2. lsa-search serve");
    println!("   3. Open http://{}:5000/", if cli.public { "0.0.0.0" } else { "127.0.0.1" });
    if cli.random_seed {
        println!("   Note: rankings depend on LSA_SEED; keep it fixed once the index is in use");
    }
    println!();
}
