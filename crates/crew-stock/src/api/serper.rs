//! Google Serper web search client

use crate::api::{WebSearch, http_client, send};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use tracing::{debug, instrument};

const SERPER_URL: &str = "https://google.serper.dev/search";
const PROVIDER: &str = "Google Serper";

/// One organic search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.link)
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// Serper search client
#[derive(Clone)]
pub struct SerperClient {
    client: Client,
    api_key: Option<String>,
    retry: RetryPolicy,
    result_limit: usize,
}

impl SerperClient {
    /// Create a client from configuration
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout, "stock-crew/0.1")?,
            api_key: config.serper_api_key.clone(),
            retry: config.retry_policy(),
            result_limit: config.result_limit,
        })
    }
}

/// Keep the first `limit` organic hits
pub(crate) fn parse_results(body: &str, limit: usize) -> Result<Vec<SearchHit>> {
    let response: SerperResponse = serde_json::from_str(body)?;
    Ok(response.organic.into_iter().take(limit).collect())
}

/// Render hits as `title: link` lines
pub fn render_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No search results found for query '{query}'.");
    }
    hits.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl WebSearch for SerperClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(StockError::MissingApiKey("SERPER_API_KEY"))?;
        let body = json!({ "q": query, "num": self.result_limit });
        let (client, body) = (&self.client, &body);

        let text = self
            .retry
            .execute("serper.search", || async move {
                let request = client
                    .post(SERPER_URL)
                    .header("X-API-KEY", api_key)
                    .json(body);
                Ok::<_, StockError>(send(PROVIDER, request).await?.text().await?)
            })
            .await?;

        let hits = parse_results(&text, self.result_limit)?;
        debug!(query, hits = hits.len(), "Search finished");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "searchParameters": {"q": "Tesla news"},
        "organic": [
            {"title": "Tesla deliveries", "link": "https://example.com/1", "snippet": "Q3"},
            {"title": "Tesla recall", "link": "https://example.com/2"},
            {"title": "Tesla earnings", "link": "https://example.com/3"}
        ]
    }"#;

    #[test]
    fn test_parse_results_respects_limit() {
        let hits = parse_results(BODY, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet.as_deref(), Some("Q3"));
        assert_eq!(hits[1].to_string(), "Tesla recall: https://example.com/2");
    }

    #[test]
    fn test_parse_without_organic() {
        assert!(parse_results("{}", 5).unwrap().is_empty());
    }

    #[test]
    fn test_render_hits() {
        let hits = parse_results(BODY, 5).unwrap();
        let text = render_hits("Tesla news", &hits);
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("Tesla deliveries: https://example.com/1"));

        assert_eq!(
            render_hits("Nothing", &[]),
            "No search results found for query 'Nothing'."
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error() {
        let client = SerperClient::new(&StockConfig::default()).unwrap();
        let err = client.search("Apple news").await.unwrap_err();
        assert!(matches!(err, StockError::MissingApiKey("SERPER_API_KEY")));
    }
}
