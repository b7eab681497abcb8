//! Encyclopedia full-text search, the degraded fallback source.
//!
//! Returns ranked page titles only; callers get no coordinates and no tags.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::SearchSource;
use crate::net::{self, SourceError};

const SEARCH_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

pub struct WikipediaSearch {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchBody>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

impl WikipediaSearch {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(SEARCH_ENDPOINT, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: net::http_client(timeout),
            endpoint: endpoint.into(),
        }
    }
}

impl SearchSource for WikipediaSearch {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("format", "json"),
                ("srlimit", &limit.to_string()),
            ])
            .send()
            .map_err(SourceError::from_request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::from_status(status));
        }

        let parsed: SearchResponse = resp
            .json()
            .map_err(|err| SourceError::Terminal(format!("malformed response: {err}")))?;

        Ok(parsed
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "wikipedia-search"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_titles() {
        let json = r#"{
            "query": {"search": [
                {"title": "Eiffel Tower", "pageid": 9232},
                {"title": "Champ de Mars", "pageid": 1234}
            ]}
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let titles: Vec<String> = parsed
            .query
            .map(|q| q.search.into_iter().map(|h| h.title).collect())
            .unwrap_or_default();
        assert_eq!(titles, ["Eiffel Tower", "Champ de Mars"]);
    }

    #[test]
    fn test_parse_missing_query_block() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"batchcomplete": ""}"#).unwrap();
        assert!(parsed.query.is_none());
    }
}
