//! Short description lookup for a matched POI.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::net;

const SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const NO_DESCRIPTION: &str = "No description available.";

pub struct Describer {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Clone)]
pub struct PoiInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    title: Option<String>,
    extract: Option<String>,
}

impl Describer {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(SUMMARY_ENDPOINT, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: net::http_client(timeout),
            endpoint: endpoint.into(),
        }
    }

    /// Best-effort: any lookup failure collapses to the fixed fallback text.
    pub fn fetch_info(&self, title: &str) -> PoiInfo {
        match self.summary(title) {
            Ok(Some(info)) => info,
            Ok(None) => PoiInfo {
                name: title.to_string(),
                description: NO_DESCRIPTION.to_string(),
            },
            Err(err) => {
                log::debug!("summary lookup failed for {title:?}: {err}");
                PoiInfo {
                    name: title.to_string(),
                    description: NO_DESCRIPTION.to_string(),
                }
            }
        }
    }

    fn summary(&self, title: &str) -> anyhow::Result<Option<PoiInfo>> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("bad summary endpoint"))?
            .push(title);

        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Ok(None);
        }

        let summary: PageSummary = resp.json()?;
        let Some(extract) = summary.extract.filter(|e| !e.is_empty()) else {
            return Ok(None);
        };
        Ok(Some(PoiInfo {
            name: summary.title.unwrap_or_else(|| title.to_string()),
            description: extract,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_fields() {
        let json = r#"{"title": "Eiffel Tower", "extract": "Wrought-iron lattice tower."}"#;
        let summary: PageSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.title.as_deref(), Some("Eiffel Tower"));
        assert_eq!(summary.extract.as_deref(), Some("Wrought-iron lattice tower."));
    }

    #[test]
    fn test_lookup_failure_degrades_to_fallback_text() {
        // unroutable endpoint, tiny timeout
        let describer = Describer::with_endpoint(
            "http://127.0.0.1:9/api/rest_v1/page/summary",
            Duration::from_millis(50),
        );
        let info = describer.fetch_info("Eiffel Tower");
        assert_eq!(info.name, "Eiffel Tower");
        assert_eq!(info.description, NO_DESCRIPTION);
    }
}
