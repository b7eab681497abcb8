//! Shared mocks and fixtures.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

use crate::embedding::{EmbedError, Embedder};
use crate::geo::Coordinate;
use crate::poi::Poi;
use crate::retrieval::Feature;

/// Embedder returning scripted vectors. Texts are keyed by the exact input
/// string, images by the path's file name; unknown inputs get zero vectors
/// so misconfigured tests fail loudly on score.
pub struct MockEmbedder {
    pub texts: HashMap<String, Vec<f32>>,
    pub images: HashMap<String, Vec<f32>>,
    pub dims: usize,
}

impl MockEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            texts: HashMap::new(),
            images: HashMap::new(),
            dims,
        }
    }

    pub fn with_text(mut self, key: &str, vector: Vec<f32>) -> Self {
        self.texts.insert(key.to_string(), vector);
        self
    }

    pub fn with_image(mut self, file_name: &str, vector: Vec<f32>) -> Self {
        self.images.insert(file_name.to_string(), vector);
        self
    }
}

impl Embedder for MockEmbedder {
    fn encode_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts
            .iter()
            .map(|t| self.texts.get(t).cloned().unwrap_or(vec![0.0; self.dims]))
            .collect())
    }

    fn encode_images(&self, images: &[PathBuf]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(images
            .iter()
            .map(|p| {
                let key = p
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                self.images.get(&key).cloned().unwrap_or(vec![0.0; self.dims])
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

pub fn poi(name: &str, image_file: Option<&str>) -> Poi {
    Poi {
        name: name.to_string(),
        coordinate: None,
        tags: HashMap::new(),
        image_path: image_file.map(PathBuf::from),
    }
}

pub fn feature(name: &str, lat: f64, lon: f64) -> Feature {
    Feature {
        name: name.to_string(),
        coordinate: Some(Coordinate::new(lat, lon)),
        tags: HashMap::new(),
    }
}

/// Valid PNG bytes large enough to pass cache validation.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
