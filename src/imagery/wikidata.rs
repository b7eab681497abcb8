//! Structured image lookup: knowledge-base entity record to image property
//! to file-serving download.

use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use super::ImageSource;
use crate::net;

const CLAIMS_ENDPOINT: &str = "https://www.wikidata.org/w/api.php";
const FILEPATH_ENDPOINT: &str = "https://commons.wikimedia.org/wiki/Special:FilePath";
/// The "image" property on Wikidata entities.
const IMAGE_PROPERTY: &str = "P18";
const DOWNLOAD_WIDTH: u32 = 640;

pub struct WikidataImages {
    client: Client,
    endpoint: String,
}

impl WikidataImages {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(CLAIMS_ENDPOINT, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: net::http_client(timeout),
            endpoint: endpoint.into(),
        }
    }

    /// First value of the entity's image property, if any.
    fn image_claim(&self, qid: &str) -> anyhow::Result<Option<String>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "wbgetclaims"),
                ("entity", qid),
                ("property", IMAGE_PROPERTY),
                ("format", "json"),
            ])
            .send()?;

        if !resp.status().is_success() {
            anyhow::bail!("entity lookup returned {}", resp.status());
        }

        let json: serde_json::Value = resp.json()?;
        Ok(extract_image_filename(&json))
    }
}

fn extract_image_filename(json: &serde_json::Value) -> Option<String> {
    json["claims"][IMAGE_PROPERTY]
        .get(0)
        .and_then(|claim| claim.pointer("/mainsnak/datavalue/value"))
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
}

impl ImageSource for WikidataImages {
    fn fetch(&self, _name: &str, wikidata_id: Option<&str>) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(qid) = wikidata_id else {
            return Ok(None);
        };
        let Some(filename) = self.image_claim(qid)? else {
            return Ok(None);
        };

        // Special:FilePath redirects to the scaled binary.
        let mut url = Url::parse(FILEPATH_ENDPOINT)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("bad file endpoint"))?
            .push(&filename);
        url.set_query(Some(&format!("width={DOWNLOAD_WIDTH}")));

        Ok(net::fetch_bytes(&self.client, url.as_str()).filter(|bytes| !bytes.is_empty()))
    }

    fn name(&self) -> &'static str {
        "wikidata"
    }
}
