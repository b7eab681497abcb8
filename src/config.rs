//! Configuration for the recognition pipeline.
//!
//! Every component takes its slice of this structure at construction time;
//! there is no ambient mutable state. The file is YAML and is created with
//! defaults on first load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_SECS: f64 = 2.0;
const DEFAULT_QUERY_TIMEOUT_SECS: f64 = 10.0;
const DEFAULT_IMAGE_TIMEOUT_SECS: f64 = 6.0;
const DEFAULT_FETCH_WORKERS: usize = 4;

/// Image similarity dominates when reference images are available.
const DEFAULT_ALPHA: f32 = 0.9;
const DEFAULT_LOCALE_HINT: &str = "France";

const DEFAULT_EMBEDDING_BACKEND: &str = "clip";
/// Vector width of the degraded zero-vector backend.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 512;

/// POI retrieval: retry budget and backoff for the primary source, plus the
/// worker pool bound for per-POI image fetches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: f64,
    #[serde(default = "default_query_timeout_secs")]
    pub request_timeout_secs: f64,
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_secs: DEFAULT_BACKOFF_SECS,
            request_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            fetch_workers: DEFAULT_FETCH_WORKERS,
        }
    }
}

impl RetrievalConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }
}

/// Reference image acquisition and the on-disk cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageryConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// When true, POIs with no retrievable photograph get a synthesized
    /// placeholder; when false they stay imageless and are excluded from
    /// image-based matching.
    #[serde(default)]
    pub generate_placeholders: bool,
    #[serde(default = "default_image_timeout_secs")]
    pub request_timeout_secs: f64,
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            generate_placeholders: false,
            request_timeout_secs: DEFAULT_IMAGE_TIMEOUT_SECS,
        }
    }
}

impl ImageryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }
}

/// Embedding backend selection. The backend is fixed at construction; there
/// is no runtime probing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "clip" for the CLIP text+vision pair, "none" for zero vectors.
    #[serde(default = "default_embedding_backend")]
    pub backend: String,
    #[serde(default = "default_model_cache_dir")]
    pub model_cache_dir: PathBuf,
    /// Vector width used by the "none" backend; "clip" probes its own.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_EMBEDDING_BACKEND.to_string(),
            model_cache_dir: default_model_cache_dir(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// Match engine policy and fusion weights.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Image-similarity weight; the text weight is derived as `1 - alpha`.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Strict policy: only POIs with a reference image enter the reference
    /// set and scoring fuses image and text similarity. When false all POIs
    /// are retained and scoring is text-only.
    #[serde(default = "default_require_image")]
    pub require_image_for_match: bool,
    #[serde(default = "default_locale_hint")]
    pub locale_hint: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            require_image_for_match: true,
            locale_hint: DEFAULT_LOCALE_HINT.to_string(),
        }
    }
}

impl MatchConfig {
    pub fn beta(&self) -> f32 {
        1.0 - self.alpha
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub imagery: ImageryConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub matching: MatchConfig,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_secs() -> f64 {
    DEFAULT_BACKOFF_SECS
}

fn default_query_timeout_secs() -> f64 {
    DEFAULT_QUERY_TIMEOUT_SECS
}

fn default_image_timeout_secs() -> f64 {
    DEFAULT_IMAGE_TIMEOUT_SECS
}

fn default_fetch_workers() -> usize {
    DEFAULT_FETCH_WORKERS
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/references")
}

fn default_model_cache_dir() -> PathBuf {
    PathBuf::from("data/models")
}

fn default_embedding_backend() -> String {
    DEFAULT_EMBEDDING_BACKEND.to_string()
}

fn default_embedding_dimensions() -> usize {
    DEFAULT_EMBEDDING_DIMENSIONS
}

fn default_alpha() -> f32 {
    DEFAULT_ALPHA
}

fn default_require_image() -> bool {
    true
}

fn default_locale_hint() -> String {
    DEFAULT_LOCALE_HINT.to_string()
}

impl Config {
    fn validate(&self) {
        if self.retrieval.max_retries == 0 {
            panic!("retrieval.max_retries must be at least 1");
        }
        if self.retrieval.backoff_secs < 0.0 {
            panic!("retrieval.backoff_secs must not be negative");
        }
        if self.retrieval.request_timeout_secs <= 0.0 {
            panic!("retrieval.request_timeout_secs must be greater than 0");
        }
        if self.retrieval.fetch_workers == 0 {
            panic!("retrieval.fetch_workers must be at least 1");
        }
        if self.imagery.request_timeout_secs <= 0.0 {
            panic!("imagery.request_timeout_secs must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.matching.alpha) {
            panic!(
                "matching.alpha must be between 0.0 and 1.0, got {}",
                self.matching.alpha
            );
        }
        match self.embedding.backend.as_str() {
            "clip" | "none" => {}
            other => panic!("embedding.backend must be 'clip' or 'none', got '{other}'"),
        }
        if self.embedding.dimensions == 0 {
            panic!("embedding.dimensions must be greater than 0");
        }
    }

    /// Load the config file, creating it with defaults if missing.
    pub fn load_with(path: &Path) -> Self {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            std::fs::write(path, serde_yml::to_string(&Self::default()).unwrap())
                .expect("cannot write default config");
            log::info!("created default config at {}", path.display());
        }

        let raw = std::fs::read_to_string(path).expect("config file is not readable");
        let config: Self = serde_yml::from_str(&raw).expect("config is malformed");
        config.validate();
        config
    }
}
