//! Batched embedding pipeline.
//!
//! Sits between the orchestrator and the encoder:
//! - lazily loads the model on first use (a failed load is retried on the
//!   next call, never cached as a permanent fault)
//! - chunks batch input and paces between chunks to stay under the
//!   encoder's resource ceiling
//! - swallows per-text failures at the batch level; callers must handle
//!   output shorter than input

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SemanticSearchConfig;
use crate::semantic::embeddings::{EmbeddingError, EmbeddingModel, TextEncoder};

pub struct EmbeddingService {
    config: SemanticSearchConfig,
    cache_dir: PathBuf,
    /// Lazily-initialized encoder. An async Mutex rather than OnceLock so
    /// a failed initialization can be retried later, and so the guard can
    /// be held across the spawn_blocking load (at most one load at a time).
    encoder: tokio::sync::Mutex<Option<Arc<dyn TextEncoder>>>,
}

impl EmbeddingService {
    pub fn new(config: SemanticSearchConfig, cache_dir: PathBuf) -> Self {
        Self {
            config,
            cache_dir,
            encoder: tokio::sync::Mutex::new(None),
        }
    }

    /// Service with a pre-seeded encoder; nothing is loaded lazily.
    #[cfg(test)]
    pub(crate) fn with_encoder(
        config: SemanticSearchConfig,
        encoder: Arc<dyn TextEncoder>,
    ) -> Self {
        Self {
            config,
            cache_dir: PathBuf::new(),
            encoder: tokio::sync::Mutex::new(Some(encoder)),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_encoder(&self, encoder: Arc<dyn TextEncoder>) {
        *self.encoder.try_lock().expect("encoder lock held") = Some(encoder);
    }

    /// Embed a single query text.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoder = self.get_or_init_encoder().await?;
        encode_blocking(encoder, text.to_string()).await
    }

    /// Embed `texts` in fixed-size chunks, keeping each surviving vector
    /// paired with the index of the text that produced it.
    ///
    /// Texts whose embedding fails are dropped, not zero-filled. Within a
    /// chunk, texts are embedded sequentially to bound peak resource use;
    /// after each chunk the task suspends for the configured pacing delay.
    pub async fn embed_batch_indexed(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Vec<(usize, Vec<f32>)> {
        if texts.is_empty() {
            return vec![];
        }

        // Encoder init failure fails the whole batch; the next call retries.
        let encoder = match self.get_or_init_encoder().await {
            Ok(encoder) => encoder,
            Err(err) => {
                log::warn!("embedding batch skipped: {}", err);
                return vec![];
            }
        };

        let batch_size = batch_size.max(1);
        let delay = Duration::from_millis(self.config.batch_delay_ms);
        let mut results = Vec::with_capacity(texts.len());

        for (chunk_no, chunk) in texts.chunks(batch_size).enumerate() {
            if chunk_no > 0 {
                // Pacing against the encoder, not a correctness requirement
                tokio::time::sleep(delay).await;
            }

            log::debug!(
                "embedding chunk {} of {}",
                chunk_no + 1,
                texts.len().div_ceil(batch_size)
            );

            for (offset, text) in chunk.iter().enumerate() {
                let position = chunk_no * batch_size + offset;
                match encode_blocking(Arc::clone(&encoder), text.clone()).await {
                    Ok(vector) => results.push((position, vector)),
                    Err(err) => {
                        log::warn!("dropping text at position {}: {}", position, err);
                    }
                }
            }
        }

        results
    }

    /// Embed `texts`, returning the surviving vectors in input order.
    ///
    /// Output length may be shorter than input length.
    pub async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Vec<Vec<f32>> {
        self.embed_batch_indexed(texts, batch_size)
            .await
            .into_iter()
            .map(|(_, vector)| vector)
            .collect()
    }

    /// Get the encoder, loading the model if this is the first use.
    ///
    /// The load (model download, session setup, dimension probe) blocks for
    /// seconds, so it runs on the blocking pool like every other encoder
    /// call.
    async fn get_or_init_encoder(&self) -> Result<Arc<dyn TextEncoder>, EmbeddingError> {
        let mut guard = self.encoder.lock().await;

        if let Some(encoder) = guard.as_ref() {
            return Ok(Arc::clone(encoder));
        }

        log::info!("loading embedding model '{}'", self.config.model);
        let name = self.config.model.clone();
        let cache_dir = self.cache_dir.clone();
        let model = tokio::task::spawn_blocking(move || EmbeddingModel::load(&name, cache_dir))
            .await
            .map_err(|e| EmbeddingError::TaskFailed(e.to_string()))??;

        let encoder: Arc<dyn TextEncoder> = Arc::new(model);
        *guard = Some(Arc::clone(&encoder));

        Ok(encoder)
    }
}

/// Run the blocking encoder call off the async worker threads.
async fn encode_blocking(
    encoder: Arc<dyn TextEncoder>,
    text: String,
) -> Result<Vec<f32>, EmbeddingError> {
    tokio::task::spawn_blocking(move || encoder.encode(&text))
        .await
        .map_err(|e| EmbeddingError::TaskFailed(e.to_string()))?
}
