mod config;
mod embeddings;
mod host;
mod logging;
mod matching;
mod native_messaging;
mod paths;
mod protocol;
mod vocab;

use std::io::{stdin, stdout, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::embeddings::download::{self, PinnedDigests};
use crate::embeddings::engine::EmbeddingEngine;
use crate::matching::Thresholds;
use crate::vocab::SynonymDictionary;

#[derive(Parser)]
#[command(name = "semantic-matcher")]
#[command(version, about = "Match free-text item names against a ground-truth vocabulary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve length-prefixed JSON requests on stdin/stdout (default)
    Host,
    /// Match one key-item: direct match first, synonym cluster as fallback
    Match {
        /// Key-item to match
        query: String,
        /// Print only the ranked matches, without the stage
        #[arg(long)]
        flat: bool,
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Run both passes for every key-item in the synonym dictionary
    Experiment {
        #[command(flatten)]
        inputs: Inputs,
    },
}

#[derive(Args)]
struct Inputs {
    /// JSON list of ground-truth item names
    #[arg(long, default_value = "ground_truth_entities.json")]
    ground_truth: PathBuf,

    /// YAML synonym file (`nlu` list of `synonym`/`examples` records)
    #[arg(long, default_value = "synonyms.yml")]
    synonyms: PathBuf,

    /// Hugging Face model id
    #[arg(long, env = "SEMANTIC_MATCHER_MODEL", default_value = config::embedding::DEFAULT_MODEL_NAME)]
    model: String,

    /// Local directory with model.safetensors, tokenizer.json and config.json (skips download)
    #[arg(long, env = "SEMANTIC_MATCHER_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Threshold for the key-item pass
    #[arg(long, default_value_t = config::matching::DEFAULT_KEY_ITEM_THRESHOLD)]
    t_key_match: f64,

    /// Threshold for the synonym-cluster pass
    #[arg(long, default_value_t = config::matching::DEFAULT_SYNONYM_CLUSTER_THRESHOLD)]
    t_synonym_match: f64,
}

struct Loaded {
    ground_truth: Vec<String>,
    synonyms: SynonymDictionary,
    engine: EmbeddingEngine,
    thresholds: Thresholds,
}

impl Inputs {
    fn load(&self) -> anyhow::Result<Loaded> {
        let thresholds = Thresholds::new(self.t_key_match, self.t_synonym_match)?;
        let ground_truth = vocab::load_ground_truth(&self.ground_truth)?;
        let synonyms = SynonymDictionary::load(&self.synonyms)?;
        log::info!("Vocabulary loaded: {} items, {} synonym entries", ground_truth.len(), synonyms.len());

        let model_dir = download::resolve_model_dir(&self.model, self.model_dir.as_deref(), &PinnedDigests::new())?;
        let engine = EmbeddingEngine::load(&model_dir)?;

        Ok(Loaded {
            ground_truth,
            synonyms,
            engine,
            thresholds,
        })
    }
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("[semantic-matcher] fatal error: {e:?}");
        log::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    match cli.command.unwrap_or(Command::Host) {
        Command::Host => run_host(),
        Command::Match { query, flat, inputs } => run_match(&query, flat, &inputs),
        Command::Experiment { inputs } => run_experiment(&inputs),
    }
}

fn run_host() -> anyhow::Result<()> {
    log::info!("=== Semantic Matcher Host Started ===");
    let mut state = host::HostState::new();
    host::run(&mut state, &mut stdin(), &mut stdout())?;
    log::info!("=== Semantic Matcher Host Stopped ===");
    Ok(())
}

fn run_match(query: &str, flat: bool, inputs: &Inputs) -> anyhow::Result<()> {
    let loaded = inputs.load()?;
    let outcome = matching::semantic_item_match(
        &loaded.engine,
        query,
        &loaded.ground_truth,
        &loaded.synonyms,
        loaded.thresholds,
    )?;
    log::info!(
        "{:?} -> {} ({} matches)",
        query,
        outcome.stage().as_str(),
        outcome.matches().map(matching::Matches::len).unwrap_or(0)
    );

    let result = if flat {
        serde_json::to_value(outcome.into_matches())?
    } else {
        outcome.to_json()
    };

    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, &result).context("failed writing result")?;
    writeln!(out)?;
    Ok(())
}

fn run_experiment(inputs: &Inputs) -> anyhow::Result<()> {
    let loaded = inputs.load()?;
    let mut out = stdout().lock();

    for key in loaded.synonyms.keys() {
        let direct = matching::key_item_match(&loaded.engine, key, &loaded.ground_truth, loaded.thresholds.key_item)?;
        let cluster = match loaded.synonyms.get(key) {
            Some(syns) if !syns.is_empty() => matching::synonym_cluster_match(
                &loaded.engine,
                syns,
                &loaded.ground_truth,
                loaded.thresholds.synonym_cluster,
            )?,
            _ => matching::Matches::default(),
        };

        let line = serde_json::json!({
            "keyItem": key,
            "keyItemMatch": direct,
            "synonymClusterMatch": cluster,
        });
        writeln!(out, "{line}")?;
    }
    Ok(())
}
