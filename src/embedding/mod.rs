//! The embedding capability seam.
//!
//! One trait, one concrete adapter per backend, selected explicitly at
//! construction time. There is no runtime probing; the "nothing available"
//! path is the zero-vector backend.

pub mod clip;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::EmbeddingConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("model initialization failed: {0}")]
    InitFailed(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("unknown embedding backend: {0}")]
    UnknownBackend(String),
}

/// Fixed-length vectors for images and text in a shared similarity space.
///
/// Implementations return one vector per input and keep the dimension
/// stable for the lifetime of the instance.
pub trait Embedder: Send + Sync {
    fn encode_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
    fn encode_images(&self, images: &[PathBuf]) -> Result<Vec<Vec<f32>>, EmbedError>;
    fn dimensions(&self) -> usize;
}

/// Deterministic degraded mode: zero vectors of a fixed width. Similarity
/// against these degenerates to near-zero scores downstream instead of
/// crashing the session.
pub struct NoopEmbedder {
    dims: usize,
}

impl NoopEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Embedder for NoopEmbedder {
    fn encode_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dims]).collect())
    }

    fn encode_images(&self, images: &[PathBuf]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(images.iter().map(|_| vec![0.0; self.dims]).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Build the configured backend.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbedError> {
    match config.backend.as_str() {
        "clip" => Ok(Arc::new(clip::ClipEmbedder::new(
            config.model_cache_dir.clone(),
        )?)),
        "none" => Ok(Arc::new(NoopEmbedder::new(config.dimensions))),
        other => Err(EmbedError::UnknownBackend(other.to_string())),
    }
}
