//! Encyclopedia thumbnail lookup, the second tier of the fallback chain.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use super::ImageSource;
use crate::net;

const SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

pub struct WikipediaThumbs {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

impl WikipediaThumbs {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(SUMMARY_ENDPOINT, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: net::http_client(timeout),
            endpoint: endpoint.into(),
        }
    }
}

impl ImageSource for WikipediaThumbs {
    fn fetch(&self, name: &str, _wikidata_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("bad summary endpoint"))?
            .push(name);

        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            // a 404 just means no article under that title
            return Ok(None);
        }

        let summary: PageSummary = resp.json()?;
        let Some(thumb_url) = summary.thumbnail.and_then(|t| t.source) else {
            return Ok(None);
        };

        Ok(net::fetch_bytes(&self.client, &thumb_url))
    }

    fn name(&self) -> &'static str {
        "wikipedia-thumbnail"
    }
}
