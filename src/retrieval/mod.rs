//! POI retrieval: primary geospatial query with retry and backoff, degraded
//! text-search fallback, dedup and distance ranking, then per-POI reference
//! image resolution.

pub mod overpass;
pub mod wikipedia;

use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::RetrievalConfig;
use crate::geo::{haversine_distance, Coordinate};
use crate::imagery::ImageStore;
use crate::net::SourceError;
use crate::poi::{Poi, WIKIDATA_TAG};

/// A raw named feature from a geospatial source, before ranking.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub coordinate: Option<Coordinate>,
    pub tags: HashMap<String, String>,
}

/// Primary source: bounded-area feature query around a center.
pub trait GeoSource: Send + Sync {
    fn query(&self, center: Coordinate, radius_m: u32) -> Result<Vec<Feature>, SourceError>;
    fn name(&self) -> &'static str;
}

/// Degraded fallback: free-text search returning titles only.
pub trait SearchSource: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError>;
    fn name(&self) -> &'static str;
}

/// Ranked feature awaiting image resolution. The distance is only used for
/// ordering and never leaves this module.
struct Candidate {
    feature: Feature,
    distance_m: f64,
}

pub struct Retriever {
    geo: Box<dyn GeoSource>,
    fallback: Box<dyn SearchSource>,
    images: ImageStore,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        geo: Box<dyn GeoSource>,
        fallback: Box<dyn SearchSource>,
        images: ImageStore,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            geo,
            fallback,
            images,
            config,
        }
    }

    /// POIs near `center`, ascending by distance, at most `max_results`.
    ///
    /// Total failure of both sources yields an empty list, never an error;
    /// callers must treat empty results as a valid outcome.
    pub fn retrieve(&self, center: Coordinate, radius_km: f64, max_results: usize) -> Vec<Poi> {
        let radius_m = (radius_km * 1000.0) as u32;
        log::info!(
            "querying {} for POIs within {radius_m} m of ({}, {})",
            self.geo.name(),
            center.lat,
            center.lon
        );

        let mut features = self.query_primary(center, radius_m);
        if features.is_empty() {
            features = self.query_fallback(center, max_results);
        }

        let ranked = rank(center, features, max_results);
        self.resolve_images(ranked)
    }

    /// Run the primary query under the retry budget. Rate limiting, other
    /// failures, and empty results all count as transient: wait out the
    /// backoff and try again until the budget is spent.
    fn query_primary(&self, center: Coordinate, radius_m: u32) -> Vec<Feature> {
        let attempts = self.config.max_retries;
        for attempt in 1..=attempts {
            match self.geo.query(center, radius_m) {
                Ok(features) if !features.is_empty() => {
                    log::info!(
                        "{}: {} usable features on attempt {attempt}",
                        self.geo.name(),
                        features.len()
                    );
                    return features;
                }
                Ok(_) => {
                    log::warn!("{}: empty result on attempt {attempt}", self.geo.name());
                }
                Err(SourceError::RateLimited) => {
                    log::warn!("{}: rate limited on attempt {attempt}", self.geo.name());
                }
                Err(err) => {
                    log::warn!("{}: attempt {attempt} failed: {err}", self.geo.name());
                }
            }
            if attempt < attempts {
                std::thread::sleep(self.config.backoff());
            }
        }
        Vec::new()
    }

    /// Degraded path once the primary budget is exhausted. Results carry no
    /// coordinate and no tags.
    fn query_fallback(&self, center: Coordinate, limit: usize) -> Vec<Feature> {
        let query = format!("monument near {} {}", center.lat, center.lon);
        log::info!("falling back to {} with query {query:?}", self.fallback.name());
        match self.fallback.search(&query, limit) {
            Ok(titles) => titles
                .into_iter()
                .map(|name| Feature {
                    name,
                    coordinate: None,
                    tags: HashMap::new(),
                })
                .collect(),
            Err(err) => {
                log::warn!("{}: fallback failed: {err}", self.fallback.name());
                Vec::new()
            }
        }
    }

    /// Resolve reference images on a bounded worker pool. Collection is by
    /// index, so output keeps the ranked order no matter which fetch
    /// finishes first.
    fn resolve_images(&self, candidates: Vec<Candidate>) -> Vec<Poi> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.fetch_workers)
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                candidates
                    .into_par_iter()
                    .map(|c| self.build_poi(c))
                    .collect()
            }),
            Err(err) => {
                log::warn!("image fetch pool unavailable ({err}); fetching serially");
                candidates.into_iter().map(|c| self.build_poi(c)).collect()
            }
        }
    }

    /// Final construction point: a `Poi` only exists once its image lookup
    /// has resolved, one way or the other.
    fn build_poi(&self, candidate: Candidate) -> Poi {
        let Feature {
            name,
            coordinate,
            tags,
        } = candidate.feature;
        let wikidata_id = tags.get(WIKIDATA_TAG).cloned();
        let image_path = self.images.acquire(&name, wikidata_id.as_deref());
        if image_path.is_none() {
            log::debug!("no reference image for {name:?}");
        }
        Poi {
            name,
            coordinate,
            tags,
            image_path,
        }
    }
}

/// Dedup by name keeping the closest occurrence, sort ascending by distance
/// (unknown coordinates sort last), truncate. The sort is stable, so
/// features without a coordinate keep their source order.
fn rank(center: Coordinate, features: Vec<Feature>, max_results: usize) -> Vec<Candidate> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut ranked: Vec<Candidate> = Vec::new();
    for feature in features {
        let distance_m = feature
            .coordinate
            .map(|c| haversine_distance(center, c))
            .unwrap_or(f64::INFINITY);
        match by_name.get(&feature.name) {
            Some(&idx) => {
                if distance_m < ranked[idx].distance_m {
                    ranked[idx] = Candidate {
                        feature,
                        distance_m,
                    };
                }
            }
            None => {
                by_name.insert(feature.name.clone(), ranked.len());
                ranked.push(Candidate {
                    feature,
                    distance_m,
                });
            }
        }
    }

    ranked.sort_by(|a, b| {
        a.distance_m
            .partial_cmp(&b.distance_m)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(max_results);
    ranked
}
