//! Multi-modal match engine: reference embeddings built once per session,
//! weighted cosine fusion per frame.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::MatchConfig;
use crate::embedding::{EmbedError, Embedder};
use crate::poi::Poi;

/// Keeps degenerate zero vectors finite: they normalize to near-zero
/// instead of NaN.
const NORM_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    TextOnly,
    ImageAndText,
}

/// Per-frame outcome; borrows the engine's reference POI.
#[derive(Debug)]
pub struct MatchResult<'a> {
    pub poi: &'a Poi,
    /// Cosine-range similarity in [-1, 1]. Thresholding is the caller's
    /// responsibility.
    pub score: f32,
    pub modality: Modality,
}

/// Two-phase engine: unprepared until `prepare` builds a non-empty
/// reference set, then scored per frame with `match_frame`.
///
/// `prepare` takes `&mut self` and `match_frame` takes `&self`, so the
/// borrow checker enforces that references are never replaced mid-match.
pub struct MatchEngine {
    embedder: Arc<dyn Embedder>,
    config: MatchConfig,
    refs: Vec<Poi>,
    text_embeddings: Vec<Vec<f32>>,
    /// Index-aligned with `refs`; empty in the text-only policy.
    image_embeddings: Vec<Vec<f32>>,
}

impl MatchEngine {
    pub fn new(embedder: Arc<dyn Embedder>, config: MatchConfig) -> Self {
        Self {
            embedder,
            config,
            refs: Vec::new(),
            text_embeddings: Vec::new(),
            image_embeddings: Vec::new(),
        }
    }

    pub fn reference_count(&self) -> usize {
        self.refs.len()
    }

    /// Build the reference set, replacing all previous state.
    ///
    /// Under the strict policy POIs without an image are excluded entirely.
    /// Embeddings are requested in one batched call per modality. An empty
    /// qualifying set leaves the engine unprepared.
    pub fn prepare(&mut self, pois: Vec<Poi>) -> Result<(), EmbedError> {
        self.refs.clear();
        self.text_embeddings.clear();
        self.image_embeddings.clear();

        let retained: Vec<Poi> = if self.config.require_image_for_match {
            pois.into_iter().filter(|p| p.has_image()).collect()
        } else {
            pois
        };

        if retained.is_empty() {
            log::warn!("no qualifying POIs; match engine left unprepared");
            return Ok(());
        }

        let texts: Vec<String> = retained
            .iter()
            .map(|p| p.description(&self.config.locale_hint))
            .collect();
        log::info!("encoding {} reference descriptions", texts.len());
        let text_embeddings = self.embedder.encode_texts(&texts)?;

        let image_embeddings = if self.config.require_image_for_match {
            let paths: Vec<PathBuf> = retained
                .iter()
                .filter_map(|p| p.image_path.clone())
                .collect();
            log::info!("encoding {} reference images", paths.len());
            self.embedder.encode_images(&paths)?
        } else {
            Vec::new()
        };

        // a backend that breaks the one-vector-per-input contract must not
        // take the session down later in match_frame
        if text_embeddings.len() != retained.len()
            || (self.config.require_image_for_match && image_embeddings.len() != retained.len())
        {
            log::warn!(
                "embedder returned {} text / {} image vectors for {} references; engine left unprepared",
                text_embeddings.len(),
                image_embeddings.len(),
                retained.len()
            );
            return Ok(());
        }

        self.text_embeddings = text_embeddings.into_iter().map(l2_normalize).collect();
        self.image_embeddings = image_embeddings.into_iter().map(l2_normalize).collect();
        self.refs = retained;
        Ok(())
    }

    /// Score a frame against the reference set.
    ///
    /// Returns None while unprepared. Fused score per reference is
    /// `alpha * imageSim + beta * textSim`; the text-only policy scores on
    /// text similarity alone. Ties resolve to the first reference in stored
    /// order.
    pub fn match_frame(&self, frame: &Path) -> Result<Option<MatchResult<'_>>, EmbedError> {
        if self.refs.is_empty() {
            return Ok(None);
        }

        let mut encoded = self.embedder.encode_images(&[frame.to_path_buf()])?;
        let Some(frame_embedding) = encoded.pop() else {
            log::warn!("embedder returned nothing for frame {}", frame.display());
            return Ok(None);
        };
        let frame_embedding = l2_normalize(frame_embedding);

        let fused = !self.image_embeddings.is_empty();
        let alpha = self.config.alpha;
        let beta = self.config.beta();

        let mut best: Option<(usize, f32)> = None;
        for i in 0..self.refs.len() {
            let text_sim = dot(&frame_embedding, &self.text_embeddings[i]);
            let score = if fused {
                alpha * dot(&frame_embedding, &self.image_embeddings[i]) + beta * text_sim
            } else {
                text_sim
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }

        Ok(best.map(|(i, score)| MatchResult {
            poi: &self.refs[i],
            score,
            modality: if fused {
                Modality::ImageAndText
            } else {
                Modality::TextOnly
            },
        }))
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt() + NORM_EPSILON;
    for x in &mut v {
        *x /= norm;
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_norm() {
        let v = l2_normalize(vec![3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!((v[0] - 0.6).abs() < 1e-5);
        assert!((v[1] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_zero_vector_stays_finite() {
        let v = l2_normalize(vec![0.0; 4]);
        assert!(v.iter().all(|x| x.is_finite()));
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normalize_already_unit() {
        let v = l2_normalize(vec![1.0, 0.0]);
        assert!((v[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_of_orthogonal_vectors() {
        assert_eq!(dot(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_dot_of_identical_unit_vectors() {
        let v = l2_normalize(vec![0.3, 0.4, 0.5]);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
    }
}
