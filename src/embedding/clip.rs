//! fastembed-backed CLIP adapter.
//!
//! Uses the matched ViT-B/32 text and vision towers so text and image
//! vectors live in one similarity space. Models download to the configured
//! cache directory on first use.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};

use super::{EmbedError, Embedder};

/// Wraps both towers in mutexes because fastembed's embed() takes the model
/// mutably.
pub struct ClipEmbedder {
    text: Mutex<TextEmbedding>,
    vision: Mutex<ImageEmbedding>,
    dimensions: usize,
}

impl ClipEmbedder {
    pub fn new(model_cache_dir: PathBuf) -> Result<Self, EmbedError> {
        std::fs::create_dir_all(&model_cache_dir)
            .map_err(|e| EmbedError::InitFailed(format!("cannot create model cache dir: {e}")))?;

        let mut text = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::ClipVitB32)
                .with_cache_dir(model_cache_dir.clone())
                .with_show_download_progress(true),
        )
        .map_err(|e| EmbedError::InitFailed(e.to_string()))?;

        let vision = ImageEmbedding::try_new(
            ImageInitOptions::new(ImageEmbeddingModel::ClipVitB32)
                .with_cache_dir(model_cache_dir)
                .with_show_download_progress(true),
        )
        .map_err(|e| EmbedError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut text)?;

        Ok(Self {
            text: Mutex::new(text),
            vision: Mutex::new(vision),
            dimensions,
        })
    }

    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbedError> {
        let probe = model
            .embed(vec!["probe"], None)
            .map_err(|e| EmbedError::InitFailed(format!("dimension probe failed: {e}")))?;
        probe
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbedError::InitFailed("model returned no embedding".to_string()))
    }
}

impl Embedder for ClipEmbedder {
    fn encode_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let mut model = self
            .text
            .lock()
            .map_err(|e| EmbedError::EmbeddingFailed(format!("text model lock poisoned: {e}")))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbedError::EmbeddingFailed(e.to_string()))
    }

    fn encode_images(&self, images: &[PathBuf]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if images.is_empty() {
            return Ok(vec![]);
        }
        let mut model = self
            .vision
            .lock()
            .map_err(|e| EmbedError::EmbeddingFailed(format!("vision model lock poisoned: {e}")))?;
        model
            .embed(images.to_vec(), None)
            .map_err(|e| EmbedError::EmbeddingFailed(e.to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exercising the real towers needs a model download; keep it out of the
    // default run.
    #[test]
    #[ignore = "requires model download"]
    fn test_text_and_vision_dimensions_agree() {
        let dir = std::env::temp_dir().join("poilens-clip-test");
        let embedder = ClipEmbedder::new(dir.clone()).unwrap();
        assert_eq!(embedder.dimensions(), 512);

        let texts = vec!["a castle on a hill".to_string()];
        let vectors = embedder.encode_texts(&texts).unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), embedder.dimensions());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
