// host.rs: Request loop and handlers for the length-prefixed JSON host mode.
//
// The caller sends `init` once (vocabulary + model), then any number of `match` requests.
// The model stays loaded for the life of the process.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;

use crate::embeddings::download::{self, PinnedDigests};
use crate::embeddings::engine::EmbeddingEngine;
use crate::matching::{self, Encoder, Thresholds};
use crate::protocol::{ResponseErr, ResponseOk};
use crate::vocab::{self, SynonymDictionary};
use crate::{config, native_messaging};

#[derive(Default)]
pub struct HostState {
    pub ground_truth: Option<Vec<String>>,
    pub synonyms: Option<SynonymDictionary>,
    pub encoder: Option<Box<dyn Encoder>>,
    pub model_name: Option<String>,
    pub thresholds: Thresholds,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn run(state: &mut HostState, input: &mut dyn Read, output: &mut dyn Write) -> anyhow::Result<()> {
    log::info!("Waiting for requests on stdin...");

    let mut message_count: u64 = 0;
    loop {
        let req = match native_messaging::read_message(input) {
            Ok(Some(r)) => r,
            Ok(None) => {
                log::info!("No more messages after {} messages, exiting", message_count);
                break;
            }
            Err(e) => {
                log::error!("Error reading message: {:?}", e);
                break;
            }
        };

        message_count += 1;
        log::info!("Processing message #{}: {} (id: {})", message_count, req.method, req.id);

        let sent = match handle_request(state, &req.method, &req.params) {
            Ok(result) => native_messaging::write_message(output, &ResponseOk { id: req.id, result }),
            Err(e) => {
                log::error!("Handler error: {:?}", e);
                native_messaging::write_message(output, &ResponseErr { id: req.id, error: format!("{e:#}") })
            }
        };
        if let Err(e) = sent {
            log::error!("Error sending response: {:?}", e);
            break;
        }
    }

    Ok(())
}

pub fn handle_request(state: &mut HostState, method: &str, params: &Value) -> anyhow::Result<Value> {
    match method {
        "hello" => handle_hello(state),
        "init" => handle_init(state, params),
        "match" => handle_match(state, params),
        "keyItemMatch" => handle_key_item_match(state, params),
        "synonymMatch" => handle_synonym_match(state, params),
        "synonyms" => handle_synonyms(state, params),
        "stats" => handle_stats(state),
        _ => anyhow::bail!("Unknown method: {method}"),
    }
}

fn handle_hello(state: &HostState) -> anyhow::Result<Value> {
    Ok(serde_json::json!({
        "type": "hello-response",
        "hostVersion": config::HOST_VERSION,
        "defaultModel": config::embedding::DEFAULT_MODEL_NAME,
        "thresholds": state.thresholds,
    }))
}

fn handle_init(state: &mut HostState, params: &Value) -> anyhow::Result<Value> {
    let ground_truth_path = str_param(params, "groundTruthPath").context("Missing required parameters: groundTruthPath")?;
    let synonyms_path = str_param(params, "synonymsPath").context("Missing required parameters: synonymsPath")?;

    let thresholds = Thresholds::new(
        f64_param(params, "tKeyMatch").unwrap_or(state.thresholds.key_item),
        f64_param(params, "tSynonymMatch").unwrap_or(state.thresholds.synonym_cluster),
    )?;

    // Vocabulary errors are fatal for the request.
    let ground_truth = vocab::load_ground_truth(&PathBuf::from(ground_truth_path))?;
    let synonyms = SynonymDictionary::load(&PathBuf::from(synonyms_path))?;
    log::info!("Vocabulary loaded: {} items, {} synonym entries", ground_truth.len(), synonyms.len());
    if synonyms.is_empty() {
        log::warn!("Synonym dictionary is empty; every unmatched key-item will be reported as unknown");
    }

    let model_name = str_param(params, "modelName")
        .unwrap_or(config::embedding::DEFAULT_MODEL_NAME)
        .to_string();
    let model_dir = str_param(params, "modelDir").map(PathBuf::from);
    let pinned: PinnedDigests = params
        .get("sha256")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .context("sha256 must map file names to hex digests")?
        .unwrap_or_default();

    // A missing model leaves the vocabulary usable for `synonyms`/`stats`.
    let has_model = match download::resolve_model_dir(&model_name, model_dir.as_deref(), &pinned)
        .and_then(|dir| EmbeddingEngine::load(&dir))
    {
        Ok(engine) => {
            log::info!("Embedding engine loaded ({} dims)", engine.dims());
            state.encoder = Some(Box::new(engine));
            true
        }
        Err(e) => {
            log::warn!("Failed to load embedding model {} (matching disabled): {:?}", model_name, e);
            state.encoder = None;
            false
        }
    };

    let result = serde_json::json!({
        "ok": true,
        "items": ground_truth.len(),
        "synonyms": synonyms.len(),
        "modelName": model_name,
        "hasModel": has_model,
        "thresholds": thresholds,
    });

    state.ground_truth = Some(ground_truth);
    state.thresholds = thresholds;
    state.synonyms = Some(synonyms);
    state.model_name = Some(model_name);
    Ok(result)
}

fn handle_match(state: &HostState, params: &Value) -> anyhow::Result<Value> {
    let q = str_param(params, "q").context("q parameter is required and must be a string")?;
    let thresholds = Thresholds::new(
        f64_param(params, "tKeyMatch").unwrap_or(state.thresholds.key_item),
        f64_param(params, "tSynonymMatch").unwrap_or(state.thresholds.synonym_cluster),
    )?;
    let (items, synonyms) = require_vocab(state)?;
    let encoder = require_encoder(state)?;

    let outcome = matching::semantic_item_match(encoder, q, items, synonyms, thresholds)?;
    Ok(outcome.to_json())
}

fn handle_key_item_match(state: &HostState, params: &Value) -> anyhow::Result<Value> {
    let q = str_param(params, "q").context("q parameter is required and must be a string")?;
    let t = threshold_param(params, state.thresholds.key_item)?;
    let (items, _) = require_vocab(state)?;
    let encoder = require_encoder(state)?;

    let matches = matching::key_item_match(encoder, q, items, t)?;
    Ok(serde_json::json!({ "matches": matches }))
}

fn handle_synonym_match(state: &HostState, params: &Value) -> anyhow::Result<Value> {
    let t = threshold_param(params, state.thresholds.synonym_cluster)?;
    let (items, dictionary) = require_vocab(state)?;

    let explicit: Option<Vec<String>> = params
        .get("synonyms")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .context("synonyms must be a list of strings")?;

    let synonyms = match (&explicit, str_param(params, "q")) {
        (Some(list), _) => list.as_slice(),
        (None, Some(q)) => match dictionary.get(q) {
            Some(list) => list,
            None => return Ok(serde_json::json!({ "known": false, "matches": [] })),
        },
        (None, None) => anyhow::bail!("either q or synonyms is required"),
    };

    let encoder = require_encoder(state)?;
    let matches = matching::synonym_cluster_match(encoder, synonyms, items, t)?;
    Ok(serde_json::json!({ "known": true, "matches": matches }))
}

fn handle_synonyms(state: &HostState, params: &Value) -> anyhow::Result<Value> {
    let q = str_param(params, "q").context("q parameter is required and must be a string")?;
    let (_, dictionary) = require_vocab(state)?;
    Ok(serde_json::json!({ "synonyms": dictionary.get(q) }))
}

fn handle_stats(state: &HostState) -> anyhow::Result<Value> {
    Ok(serde_json::json!({
        "ok": true,
        "items": state.ground_truth.as_ref().map(Vec::len).unwrap_or(0),
        "synonyms": state.synonyms.as_ref().map(SynonymDictionary::len).unwrap_or(0),
        "modelName": state.model_name,
        "hasModel": state.encoder.is_some(),
        "thresholds": state.thresholds,
    }))
}

fn require_vocab(state: &HostState) -> anyhow::Result<(&[String], &SynonymDictionary)> {
    let items = state.ground_truth.as_deref().context("Vocabulary not loaded. Call 'init' first.")?;
    let synonyms = state.synonyms.as_ref().context("Vocabulary not loaded. Call 'init' first.")?;
    Ok((items, synonyms))
}

fn require_encoder(state: &HostState) -> anyhow::Result<&dyn Encoder> {
    state
        .encoder
        .as_deref()
        .context("Embedding model not loaded. Check the 'init' response (hasModel).")
}

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn f64_param(params: &Value, key: &str) -> Option<f64> {
    params.get(key).and_then(Value::as_f64)
}

fn threshold_param(params: &Value, default: f64) -> anyhow::Result<f64> {
    matching::validate_threshold("t", f64_param(params, "t").unwrap_or(default))
}
