//! Overpass API client, the primary geospatial source.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{Feature, GeoSource};
use crate::geo::Coordinate;
use crate::net::{self, SourceError};

const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

pub struct OverpassClient {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

impl OverpassClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(OVERPASS_ENDPOINT, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: net::http_client(timeout),
            endpoint: endpoint.into(),
        }
    }

    /// Fixed tag categories: historic sites and tourism features as nodes,
    /// general amenities, and historic ways/relations with their computed
    /// centers.
    fn build_query(center: Coordinate, radius_m: u32) -> String {
        let Coordinate { lat, lon } = center;
        format!(
            "[out:json];(\
             node(around:{radius_m},{lat},{lon})[historic];\
             node(around:{radius_m},{lat},{lon})[tourism];\
             node(around:{radius_m},{lat},{lon})[amenity];\
             way(around:{radius_m},{lat},{lon})[historic];\
             relation(around:{radius_m},{lat},{lon})[historic];\
             );out center;"
        )
    }
}

impl GeoSource for OverpassClient {
    fn query(&self, center: Coordinate, radius_m: u32) -> Result<Vec<Feature>, SourceError> {
        let query = Self::build_query(center, radius_m);
        log::debug!("overpass: {query}");

        let resp = self
            .client
            .post(&self.endpoint)
            .body(query)
            .send()
            .map_err(SourceError::from_request)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            return Err(SourceError::from_status(status));
        }

        let parsed: OverpassResponse = resp
            .json()
            .map_err(|err| SourceError::Terminal(format!("malformed response: {err}")))?;

        Ok(parsed
            .elements
            .into_iter()
            .filter_map(element_to_feature)
            .collect())
    }

    fn name(&self) -> &'static str {
        "overpass"
    }
}

/// Nodes carry their own position; ways and relations stand on the computed
/// center. Elements without a name or a resolvable position are unusable.
fn element_to_feature(el: Element) -> Option<Feature> {
    let name = el.tags.get("name")?.clone();
    let coordinate = match el.kind.as_str() {
        "node" => match (el.lat, el.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        },
        _ => el.center.map(|c| Coordinate::new(c.lat, c.lon)),
    }?;
    Some(Feature {
        name,
        coordinate: Some(coordinate),
        tags: el.tags,
    })
}
