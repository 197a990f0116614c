// IMPORTANT:
// Keep ALL numeric values centralized here (repo rule: no hardcoded numeric values scattered around).

// NOTE: HOST_VERSION must stay in sync with the `version` field in Cargo.toml.
pub const HOST_VERSION: &str = "0.1.0";

pub mod logging {
    pub const LOG_DIR_REL: &str = ".semantic-matcher/logs";
    pub const LOG_FILE_NAME: &str = "semantic_matcher.log";

    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;
}

pub mod native_messaging {
    pub const MAX_MESSAGE_SIZE_BYTES: u32 = 16 * 1024 * 1024;
}

pub mod matching {
    // Step 1: accept a direct key-item match above this cosine similarity.
    pub const DEFAULT_KEY_ITEM_THRESHOLD: f64 = 0.85;
    // Step 2: accept synonym-cluster matches above this cosine similarity.
    pub const DEFAULT_SYNONYM_CLUSTER_THRESHOLD: f64 = 0.8;

    pub const SCORE_DECIMALS: i32 = 2;

    pub const MIN_THRESHOLD: f64 = -1.0;
    pub const MAX_THRESHOLD: f64 = 1.0;

    // Synonym phrases are joined into one cluster text with this separator.
    pub const CLUSTER_SEPARATOR: &str = " ";
}

pub mod embedding {
    // Best performing of the evaluated German STS bi-encoders.
    pub const DEFAULT_MODEL_NAME: &str = "aari1995/German_Semantic_STS_V2";

    // BERT position embedding limit. Longer inputs are truncated before the forward pass.
    pub const MAX_TOKENS: usize = 512;

    pub const MODEL_FILES: [&str; 3] = ["model.safetensors", "tokenizer.json", "config.json"];

    // Local model storage directory (relative to home)
    pub const MODEL_ROOT_REL: &str = ".semantic-matcher/models";

    pub const POOLING_MASK_EPS: f64 = 1e-9;
    pub const L2_NORM_EPS: f64 = 1e-12;
}

pub mod download {
    pub const HUB_BASE: &str = "https://huggingface.co";
    pub const HUB_REVISION: &str = "main";

    // Weights for large BERT models are >1 GB; give the transfer room.
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

    pub const HASH_LOG_PREFIX_CHARS: usize = 12;
}
