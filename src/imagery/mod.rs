//! Reference image acquisition and the on-disk cache.
//!
//! Images are resolved through an ordered fallback chain and persisted under
//! a stable per-POI filename. A cache hit short-circuits all network access.

pub mod placeholder;
pub mod validate;
pub mod wikidata;
pub mod wikipedia;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::ImageryConfig;

/// One tier of the fallback chain.
///
/// `Ok(None)` means "this source has nothing for the POI". Errors get the
/// same treatment by the caller and only change the log line; no tier
/// failure ever aborts acquisition.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, name: &str, wikidata_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>>;
    fn name(&self) -> &'static str;
}

pub struct ImageStore {
    cache_dir: PathBuf,
    sources: Vec<Box<dyn ImageSource>>,
    generate_placeholders: bool,
}

impl ImageStore {
    pub fn new(config: &ImageryConfig) -> Self {
        let timeout = config.request_timeout();
        Self::with_sources(
            config.cache_dir.clone(),
            vec![
                Box::new(wikidata::WikidataImages::new(timeout)),
                Box::new(wikipedia::WikipediaThumbs::new(timeout)),
            ],
            config.generate_placeholders,
        )
    }

    pub fn with_sources(
        cache_dir: PathBuf,
        sources: Vec<Box<dyn ImageSource>>,
        generate_placeholders: bool,
    ) -> Self {
        Self {
            cache_dir,
            sources,
            generate_placeholders,
        }
    }

    /// Resolve a local reference image for a POI.
    ///
    /// Idempotent: an existing cache entry is returned without touching the
    /// network. On a miss the sources run in order; the first one producing
    /// bytes that survive validation wins. The outcome is always a valid
    /// local path or None, never a partial file on disk.
    pub fn acquire(&self, name: &str, wikidata_id: Option<&str>) -> Option<PathBuf> {
        if let Err(err) = fs::create_dir_all(&self.cache_dir) {
            log::warn!(
                "cannot create image cache dir {}: {err}",
                self.cache_dir.display()
            );
            return None;
        }

        let path = self
            .cache_dir
            .join(format!("{}.jpg", cache_stem(name, wikidata_id)));
        if path.exists() {
            log::debug!("cache hit for {name:?}");
            return Some(path);
        }

        for source in &self.sources {
            let bytes = match source.fetch(name, wikidata_id) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    log::debug!("{}: nothing for {name:?}", source.name());
                    continue;
                }
                Err(err) => {
                    log::debug!("{}: failed for {name:?}: {err}", source.name());
                    continue;
                }
            };
            if !validate::validate_image(&bytes) {
                log::debug!("{}: rejected unusable image for {name:?}", source.name());
                continue;
            }
            match write_atomic(&path, &bytes) {
                Ok(()) => {
                    log::info!("{}: cached image for {name:?}", source.name());
                    return Some(path);
                }
                Err(err) => {
                    log::warn!("cache write failed for {name:?}: {err}");
                    return None;
                }
            }
        }

        if self.generate_placeholders {
            let rendered = placeholder::render(name).and_then(|bytes| write_atomic(&path, &bytes));
            match rendered {
                Ok(()) => {
                    log::debug!("placeholder generated for {name:?}");
                    return Some(path);
                }
                Err(err) => log::warn!("placeholder generation failed for {name:?}: {err}"),
            }
        }

        None
    }
}

/// Cache filename stem: the stable knowledge-base id when the POI carries
/// one, otherwise the display name with separators and spaces replaced.
pub fn cache_stem(name: &str, wikidata_id: Option<&str>) -> String {
    match wikidata_id {
        Some(qid) if !qid.is_empty() => qid.to_string(),
        _ => name.replace(['/', '\\', ' '], "_"),
    }
}

/// Write-then-rename within the cache dir, so a concurrent reader can never
/// observe a partially written entry as a hit.
fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path.parent().context("cache path has no parent")?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path)?;
    Ok(())
}
