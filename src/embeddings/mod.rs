// embeddings/: Local sentence embedding engine using candle (pure Rust).
//
// Provides:
// - Model download from the Hugging Face hub
// - BERT inference with mean pooling
// - Synonym-cluster text preparation

pub mod download;
pub mod engine;
pub mod text_prep;
