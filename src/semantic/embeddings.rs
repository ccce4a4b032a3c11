//! Encoder capability backed by fastembed.
//!
//! Wraps `fastembed::TextEmbedding` as an opaque "text in, fixed-length
//! vector out" resource. The model file is downloaded on first load and
//! cached on disk; the output dimensionality is probed once at load time
//! and stays constant for the process lifetime.

use fastembed::{InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

/// Text-to-vector capability. The production implementation is
/// `EmbeddingModel`; tests substitute scripted encoders.
///
/// `encode` may block and is always driven through `spawn_blocking`.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Loaded encoder model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct EmbeddingModel {
    model: Mutex<TextEmbedding>,
    dimensions: usize,
}

impl TextEncoder for EmbeddingModel {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_one(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("model initialization failed: {0}")]
    InitFailed(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("unknown model '{0}', supported: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5 (-q suffix for quantized)")]
    UnknownModel(String),

    #[error("embedding task failed: {0}")]
    TaskFailed(String),
}

impl EmbeddingModel {
    /// Load the named model, downloading it into `cache_dir` if absent.
    pub fn load(name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let which = parse_model_name(name)?;

        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("failed to create model cache dir: {}", e))
        })?;

        let options = InitOptions::new(which)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = probe_dimensions(&mut model)?;

        Ok(Self {
            model: Mutex::new(model),
            dimensions,
        })
    }

    /// Output vector length, constant for the process lifetime.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a single text.
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::EmbeddingFailed(format!("model lock poisoned: {}", e)))?;

        model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("no embedding returned".to_string()))
    }
}

fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
    use fastembed::EmbeddingModel::*;

    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok(AllMiniLML6V2),
        "all-minilm-l6-v2-q" => Ok(AllMiniLML6V2Q),
        "bge-small-en-v1.5" => Ok(BGESmallENV15),
        "bge-small-en-v1.5-q" => Ok(BGESmallENV15Q),
        "bge-base-en-v1.5" => Ok(BGEBaseENV15),
        "bge-base-en-v1.5-q" => Ok(BGEBaseENV15Q),
        "bge-large-en-v1.5" => Ok(BGELargeENV15),
        "bge-large-en-v1.5-q" => Ok(BGELargeENV15Q),
        _ => Err(EmbeddingError::UnknownModel(name.to_string())),
    }
}

/// Embed a probe string to learn the model's output dimensionality.
fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
    let probe = model
        .embed(vec!["probe"], None)
        .map_err(|e| EmbeddingError::InitFailed(format!("dimension probe failed: {}", e)))?;

    probe
        .first()
        .map(|v| v.len())
        .ok_or_else(|| EmbeddingError::InitFailed("model returned no embedding".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_rejected() {
        let dir = std::env::temp_dir().join("docsearch-embed-unknown");
        let result = EmbeddingModel::load("no-such-model", dir);
        assert!(matches!(result, Err(EmbeddingError::UnknownModel(_))));
    }

    #[test]
    fn test_model_names_parse_case_insensitively() {
        assert!(parse_model_name("BGE-Small-EN-v1.5").is_ok());
        assert!(parse_model_name("all-MiniLM-L6-v2").is_ok());
    }

    // Integration tests require model download - run with --ignored
    #[test]
    #[ignore = "requires model download"]
    fn test_load_and_embed() {
        let dir = std::env::temp_dir().join("docsearch-embed-test");
        let model = EmbeddingModel::load("all-MiniLM-L6-v2", dir.clone()).unwrap();

        assert_eq!(model.dimensions(), 384);

        let embedding = model.embed_one("Swift Concurrency").unwrap();
        assert_eq!(embedding.len(), 384);

        // fastembed output is L2-normalized
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
