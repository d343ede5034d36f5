//! Humeur CLI
//!
//! Host for the French news sentiment pipeline: scores, analyzes and
//! validates articles read as JSON, persisting the cache between runs.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use humeur_core::{Article, SemanticAnalyzer};
use humeur_runtime::{FileStore, Pipeline, PipelineConfig};
use humeur_scoring::{Lexicon, ScoringConfig, SentimentScorer};

#[derive(Parser)]
#[command(name = "humeur")]
#[command(author, version, about = "Humeur: semantic sentiment for French news", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Directory for the persisted cache and validation history
    #[arg(long, env = "HUMEUR_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Custom lexicon TOML (default: embedded French lexicon)
    #[arg(long, env = "HUMEUR_LEXICON")]
    lexicon: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score articles (JSON array) or a bare text
    Score {
        /// Articles file, "-" for stdin
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Text to score as an article body
        #[arg(short, long)]
        text: Option<String>,

        /// Apply the calibration derived from validation history
        #[arg(long)]
        calibrated: bool,
    },

    /// Extract entities, relations, topics and key phrases
    Analyze {
        /// Articles file, "-" for stdin
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Text to analyze
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Score a batch and record a validation run
    Validate {
        /// Articles file, "-" for stdin
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Quality report and calibration from validation history
    Report,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, results to stdout
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let mut pipeline = build_pipeline(cli.cache_dir.as_deref(), cli.lexicon.as_deref())?;
    pipeline.warm_start();

    match cli.command {
        Commands::Score {
            input,
            text,
            calibrated,
        } => {
            if calibrated {
                let calibration = pipeline.calibrate();
                if !pipeline.apply_calibration(&calibration) {
                    info!("No usable calibration yet, scoring with defaults");
                }
            }
            let articles = collect_articles(input.as_deref(), text)?;
            let outcome = pipeline.score_batch(&articles);
            info!(cached = outcome.cached, scored = outcome.scored, "batch complete");

            let rows: Vec<_> = outcome
                .results
                .iter()
                .map(|r| json!({ "id": r.article_id, "result": r.result }))
                .collect();
            print_json(&rows)?;
        }
        Commands::Analyze { input, text } => {
            let articles = collect_articles(input.as_deref(), text)?;
            let rows: Vec<_> = articles.iter().map(|a| pipeline.enrich(a)).collect();
            print_json(&rows)?;
        }
        Commands::Validate { input } => {
            let articles = read_articles(&input)?;
            let outcome = pipeline.score_batch(&articles);

            // Realign results with the input order
            let results: Vec<_> = articles
                .iter()
                .filter_map(|a| {
                    outcome
                        .results
                        .iter()
                        .find(|r| r.article_id == a.id)
                        .map(|r| r.result.clone())
                })
                .collect();
            if results.len() != articles.len() {
                anyhow::bail!("Article ids must be unique within a validation batch");
            }

            let metrics = pipeline.validate(&articles, &results)?;
            let consistency = pipeline.test_consistency(&articles, &results)?;
            let calibration = pipeline.calibrate();
            print_json(&json!({
                "metrics": metrics,
                "consistency": consistency,
                "calibration": calibration,
            }))?;
        }
        Commands::Report => {
            print_json(&json!({
                "report": pipeline.report(),
                "calibration": pipeline.calibrate(),
            }))?;
        }
    }

    let summary = pipeline.close()?;
    info!(
        cache_entries = summary.cache_entries,
        validation_runs = summary.validation_runs,
        "state persisted"
    );
    Ok(())
}

fn build_pipeline(cache_dir: Option<&Path>, lexicon: Option<&Path>) -> Result<Pipeline> {
    let lexicon = match lexicon {
        Some(path) => Lexicon::load(path)
            .with_context(|| format!("Failed to load lexicon {}", path.display()))?,
        None => Lexicon::french()?,
    };
    info!("Lexicon '{}' with {} terms", lexicon.metadata().name, lexicon.len());

    let scorer = SentimentScorer::new(lexicon, SemanticAnalyzer::french()?, ScoringConfig::default());
    let pipeline = Pipeline::new(scorer, PipelineConfig::default());

    Ok(match cache_dir {
        Some(dir) => {
            let store = FileStore::open(dir)
                .with_context(|| format!("Failed to open cache directory {}", dir.display()))?;
            pipeline.with_backend(Arc::new(store))
        }
        None => pipeline,
    })
}

fn collect_articles(input: Option<&Path>, text: Option<String>) -> Result<Vec<Article>> {
    match (input, text) {
        (Some(path), _) => read_articles(path),
        (None, Some(text)) => Ok(vec![Article::new("text", "", &text)]),
        (None, None) => anyhow::bail!("Provide --input or --text"),
    }
}

fn read_articles(path: &Path) -> Result<Vec<Article>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    let articles: Vec<Article> = serde_json::from_str(&raw).context("Expected a JSON array of articles")?;
    info!("Loaded {} articles", articles.len());
    Ok(articles)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
