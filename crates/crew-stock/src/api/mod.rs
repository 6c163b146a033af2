//! API clients for stock data providers
//!
//! Each provider sits behind a small trait so agents and tools can be handed
//! any implementation; [`DataSources`] bundles the live clients built from a
//! [`StockConfig`].

pub mod scrape;
pub mod sec_api;
pub mod sec_edgar;
pub mod serper;
pub mod yahoo;

pub use scrape::{HtmlCleaner, WebScraper};
pub use sec_api::SecApiClient;
pub use sec_edgar::{FilingType, KeyFigures, SecEdgarClient, SecFiling};
pub use serper::{SearchHit, SerperClient};
pub use yahoo::{CompanyProfile, NewsItem, Quote, Valuation, YahooFinanceClient, format_market_cap};

use crate::config::StockConfig;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;

/// Web search provider
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search the web, returning at most the configured number of hits
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Quotes, price history and company lookup
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Resolve a company name or ticker to a listed symbol
    async fn resolve(&self, query: &str) -> Result<CompanyProfile>;

    /// Latest quote
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    /// Daily quotes for the last month, oldest first
    async fn month_history(&self, symbol: &str) -> Result<Vec<Quote>>;

    /// Recent news headlines
    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>>;
}

/// Regulatory filings lookup
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Most recent filing of a form type
    async fn latest_filing(&self, ticker: &str, form: FilingType) -> Result<SecFiling>;

    /// Headline figures from the latest reported period
    async fn key_figures(&self, ticker: &str) -> Result<KeyFigures>;

    /// Readable text of a filing document
    async fn document_text(&self, filing: &SecFiling) -> Result<String>;
}

/// Downloads a page and reduces it to readable text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its visible text
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Filings from SEC EDGAR, with sec-api.io used for lookups when configured
pub struct SecFilings {
    edgar: SecEdgarClient,
    sec_api: Option<SecApiClient>,
    cleaner: HtmlCleaner,
}

impl SecFilings {
    /// Combine the two filing providers
    pub fn new(edgar: SecEdgarClient, sec_api: Option<SecApiClient>) -> Result<Self> {
        Ok(Self {
            edgar,
            sec_api,
            cleaner: HtmlCleaner::new()?,
        })
    }
}

#[async_trait]
impl FilingSource for SecFilings {
    async fn latest_filing(&self, ticker: &str, form: FilingType) -> Result<SecFiling> {
        match &self.sec_api {
            Some(sec_api) => sec_api.latest_filing(ticker, form).await,
            None => self.edgar.latest_filing(ticker, form).await,
        }
    }

    async fn key_figures(&self, ticker: &str) -> Result<KeyFigures> {
        self.edgar.key_figures(ticker).await
    }

    async fn document_text(&self, filing: &SecFiling) -> Result<String> {
        let html = self.edgar.fetch_document(&filing.url).await?;
        Ok(self.cleaner.html_to_text(&html))
    }
}

/// The data adapters available to the crew
#[derive(Clone)]
pub struct DataSources {
    /// Web search
    pub search: Arc<dyn WebSearch>,
    /// Quotes and company lookup
    pub market: Arc<dyn MarketData>,
    /// Regulatory filings
    pub filings: Arc<dyn FilingSource>,
    /// Page scraping
    pub pages: Arc<dyn PageFetcher>,
}

impl DataSources {
    /// Build the live clients
    ///
    /// A missing Serper key is not an error here; searches fail with
    /// [`StockError::MissingApiKey`] when they are attempted.
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let sec_api = config
            .sec_api_key
            .as_ref()
            .map(|key| SecApiClient::new(key.clone(), config))
            .transpose()?;

        Ok(Self {
            search: Arc::new(SerperClient::new(config)?),
            market: Arc::new(YahooFinanceClient::new(config)?),
            filings: Arc::new(SecFilings::new(SecEdgarClient::new(config)?, sec_api)?),
            pages: Arc::new(WebScraper::new(config)?),
        })
    }
}

/// Build an HTTP client with a request timeout and User-Agent
pub(crate) fn http_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(StockError::from)
}

/// Send a request and turn transport and status failures into typed errors
pub(crate) async fn send(provider: &str, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            StockError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            StockError::NetworkError(e)
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 429 {
        return Err(StockError::RateLimitExceeded {
            provider: provider.to_string(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    Err(StockError::HttpStatus {
        provider: provider.to_string(),
        status: status.as_u16(),
        body: truncate(&body, 200),
    })
}

/// Cut `text` to at most `max` characters on a char boundary
pub(crate) fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("日本語テキスト", 3), "日本語...");
    }

    #[test]
    fn test_data_sources_without_keys() {
        let config = StockConfig::default();
        assert!(DataSources::from_config(&config).is_ok());
    }
}
