//! Yahoo Finance API client
//!
//! Quotes and price history come from the `yahoo_finance_api` connector; the
//! ticker search (symbol resolution and headlines) uses Yahoo's public search
//! endpoint directly.

use crate::api::{MarketData, http_client, send};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; stock-crew/0.1)";
const PROVIDER: &str = "Yahoo Finance";

/// Stock quote data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

/// Company information from the ticker search and the quote summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub valuation: Valuation,
}

/// Valuation metrics; fields Yahoo does not report stay `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Year over year, as a fraction (0.12 is 12%)
    pub revenue_growth: Option<f64>,
}

impl Valuation {
    /// Metrics of the first quote summary result
    pub(crate) fn from_summary(data: &yahoo::YSummaryData) -> Self {
        Self {
            market_cap: data
                .summary_detail
                .as_ref()
                .and_then(|d| d.market_cap)
                .map(|cap| cap as f64),
            pe_ratio: data
                .summary_detail
                .as_ref()
                .and_then(|d| d.trailing_pe)
                .filter(|pe| pe.is_finite() && *pe < f64::MAX),
            eps: data.default_key_statistics.as_ref().and_then(|k| k.trailing_eps),
            revenue_growth: data.financial_data.as_ref().and_then(|f| f.revenue_growth),
        }
    }
}

/// `$2.95T`, `$310.50B`, `$12.00M`
pub fn format_market_cap(cap: f64) -> String {
    if cap >= 1_000_000_000_000.0 {
        format!("${:.2}T", cap / 1_000_000_000_000.0)
    } else if cap >= 1_000_000_000.0 {
        format!("${:.2}B", cap / 1_000_000_000.0)
    } else if cap >= 1_000_000.0 {
        format!("${:.2}M", cap / 1_000_000.0)
    } else {
        format!("${cap:.2}")
    }
}

impl CompanyProfile {
    /// Profile for a symbol nothing else is known about
    pub fn bare(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Human-readable summary with `N/A` for unknown fields
    pub fn summary(&self) -> String {
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        let mut out = String::new();
        let _ = writeln!(out, "Company: {}", na(&self.name));
        let _ = writeln!(out, "Symbol: {}", self.symbol);
        let _ = writeln!(out, "Exchange: {}", na(&self.exchange));
        let _ = writeln!(out, "Sector: {}", na(&self.sector));
        let _ = writeln!(out, "Industry: {}", na(&self.industry));

        let metric = |v: Option<f64>, show: &dyn Fn(f64) -> String| v.map_or_else(|| "N/A".to_string(), show);
        let v = &self.valuation;
        let _ = writeln!(out, "Market Cap: {}", metric(v.market_cap, &format_market_cap));
        let _ = writeln!(out, "P/E Ratio: {}", metric(v.pe_ratio, &|pe: f64| format!("{pe:.2}")));
        let _ = writeln!(out, "EPS: {}", metric(v.eps, &|eps: f64| format!("${eps:.2}")));
        let _ = write!(
            out,
            "Revenue Growth: {}",
            metric(v.revenue_growth, &|g: f64| format!("{:.2}%", g * 100.0))
        );
        out
    }

    /// Fill in valuation and any missing sector or industry from a quote summary
    pub(crate) fn enrich(&mut self, summary: &yahoo::YQuoteSummary) {
        let Some(data) = summary
            .quote_summary
            .as_ref()
            .and_then(|s| s.result.as_ref())
            .and_then(|r| r.first())
        else {
            return;
        };
        self.valuation = Valuation::from_summary(data);
        if let Some(profile) = &data.asset_profile {
            if self.sector.is_none() {
                self.sector.clone_from(&profile.sector);
            }
            if self.industry.is_none() {
                self.industry.clone_from(&profile.industry);
            }
        }
    }
}

/// A news headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub publisher: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    shortname: Option<String>,
    #[serde(default)]
    longname: Option<String>,
    #[serde(default, rename = "exchDisp")]
    exchange_display: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default, rename = "quoteType")]
    quote_type: Option<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchNews {
    title: String,
    link: String,
    #[serde(default)]
    publisher: Option<String>,
}

/// Yahoo Finance API client
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    retry: RetryPolicy,
    timeout: Duration,
    result_limit: usize,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout, USER_AGENT)?,
            retry: config.retry_policy(),
            timeout: config.request_timeout,
            result_limit: config.result_limit,
        })
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(map_yahoo_error)
    }

    async fn with_timeout<T>(
        &self,
        future: impl std::future::Future<Output = std::result::Result<T, yahoo::YahooError>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| StockError::Timeout {
                provider: PROVIDER.to_string(),
            })?
            .map_err(map_yahoo_error)
    }

    /// Get the latest quote for a symbol
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let response = self
            .retry
            .execute("yahoo.quote", || async move {
                let provider = Self::connector()?;
                self.with_timeout(provider.get_latest_quotes(symbol, "1d"))
                    .await
            })
            .await?;

        let quote = response
            .last_quote()
            .map_err(|e| StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        Ok(to_quote(symbol, &quote))
    }

    /// Get historical quotes for a symbol
    #[instrument(skip(self))]
    pub async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| StockError::InvalidInput(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::InvalidInput(format!("Invalid end timestamp: {e}")))?;

        let response = self
            .retry
            .execute("yahoo.history", || async move {
                let provider = Self::connector()?;
                self.with_timeout(provider.get_quote_history(symbol, start_odt, end_odt))
                    .await
            })
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        debug!(symbol, points = quotes.len(), "Fetched price history");
        Ok(quotes.iter().map(|q| to_quote(symbol, q)).collect())
    }

    /// Get historical quotes with a named range (`5d`, `1mo`, `3mo`, `6mo`, `1y`, `ytd`)
    pub async fn get_historical_range(&self, symbol: &str, range: &str) -> Result<Vec<Quote>> {
        let end = Utc::now();
        let start = match range {
            "5d" => end - chrono::Duration::days(5),
            "1mo" => end - chrono::Duration::days(30),
            "3mo" => end - chrono::Duration::days(90),
            "6mo" => end - chrono::Duration::days(180),
            "1y" => end - chrono::Duration::days(365),
            "ytd" => chrono::NaiveDate::from_ymd_opt(end.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
                .ok_or_else(|| StockError::Other("Invalid start of year".to_string()))?,
            _ => return Err(StockError::InvalidInput(format!("Invalid range: {range}"))),
        };

        self.get_historical_quotes(symbol, start, end).await
    }

    /// Quote summary with the asset profile and valuation modules
    #[instrument(skip(self))]
    pub async fn get_ticker_info(&self, symbol: &str) -> Result<yahoo::YQuoteSummary> {
        self.retry
            .execute("yahoo.summary", || async move {
                let mut provider = Self::connector()?;
                self.with_timeout(provider.get_ticker_info(symbol)).await
            })
            .await
    }

    /// Run the ticker search
    #[instrument(skip(self))]
    pub(crate) async fn search(&self, query: &str) -> Result<SearchResponse> {
        let count = self.result_limit.to_string();
        let client = &self.client;
        let count = count.as_str();

        self.retry
            .execute("yahoo.search", || async move {
                let request = client.get(SEARCH_URL).query(&[
                    ("q", query),
                    ("quotesCount", count),
                    ("newsCount", count),
                ]);
                let body = send(PROVIDER, request).await?.text().await?;
                parse_search(&body)
            })
            .await
    }
}

/// Translate connector failures so transient ones are retried
fn map_yahoo_error(err: yahoo::YahooError) -> StockError {
    match err {
        yahoo::YahooError::ConnectionFailed(e) => StockError::NetworkError(e),
        yahoo::YahooError::TooManyRequests(_) => StockError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
        },
        yahoo::YahooError::FetchFailed(msg) => match http_status(&msg) {
            Some(status) => StockError::HttpStatus {
                provider: PROVIDER.to_string(),
                status,
                body: msg,
            },
            None => StockError::YahooFinanceError(msg),
        },
        other => StockError::YahooFinanceError(other.to_string()),
    }
}

/// Status code out of the connector's `HTTP error: 503 Service Unavailable`
fn http_status(message: &str) -> Option<u16> {
    message
        .strip_prefix("HTTP error: ")?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

fn to_quote(symbol: &str, quote: &yahoo::Quote) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0).unwrap_or_else(Utc::now),
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
        adjclose: quote.adjclose,
    }
}

pub(crate) fn parse_search(body: &str) -> Result<SearchResponse> {
    Ok(serde_json::from_str(body)?)
}

/// Pick the listing that best matches the user's query
///
/// An exact symbol match wins, then the first equity, then any first hit.
pub(crate) fn pick_profile(query: &str, response: &SearchResponse) -> Option<CompanyProfile> {
    let wanted = query.trim().to_uppercase();
    let quotes: Vec<&SearchQuote> = response.quotes.iter().filter(|q| q.symbol.is_some()).collect();

    let best = quotes
        .iter()
        .find(|q| q.symbol.as_deref() == Some(wanted.as_str()))
        .or_else(|| {
            quotes
                .iter()
                .find(|q| q.quote_type.as_deref() == Some("EQUITY"))
        })
        .or_else(|| quotes.first())?;

    Some(CompanyProfile {
        symbol: best.symbol.clone().unwrap_or_default(),
        name: best.longname.clone().or_else(|| best.shortname.clone()),
        exchange: best
            .exchange_display
            .clone()
            .or_else(|| best.exchange.clone()),
        sector: best.sector.clone(),
        industry: best.industry.clone(),
        valuation: Valuation::default(),
    })
}

/// Whether the query already looks like a ticker (`AAPL`, `BRK-B`, `RELIANCE.NS`)
pub(crate) fn looks_like_ticker(query: &str) -> bool {
    let query = query.trim();
    !query.is_empty()
        && query.len() <= 12
        && query.chars().any(|c| c.is_ascii_alphabetic())
        && query
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
}

#[async_trait]
impl MarketData for YahooFinanceClient {
    async fn resolve(&self, query: &str) -> Result<CompanyProfile> {
        let mut profile = match self.search(query).await {
            Ok(response) => pick_profile(query, &response)
                .or_else(|| looks_like_ticker(query).then(|| CompanyProfile::bare(query.trim())))
                .ok_or_else(|| StockError::InvalidSymbol(query.to_string()))?,
            Err(e) if looks_like_ticker(query) => {
                debug!(error = %e, "Ticker search failed, using query as symbol");
                CompanyProfile::bare(query.trim())
            }
            Err(e) => return Err(e),
        };

        // Valuation is best effort; the profile stays usable without it
        match self.get_ticker_info(&profile.symbol).await {
            Ok(summary) => profile.enrich(&summary),
            Err(e) => debug!(symbol = %profile.symbol, error = %e, "Quote summary unavailable"),
        }
        Ok(profile)
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        self.get_quote(symbol).await
    }

    async fn month_history(&self, symbol: &str) -> Result<Vec<Quote>> {
        let quotes = self.get_historical_range(symbol, "1mo").await?;
        if quotes.is_empty() {
            return Err(StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no price history for the last month".to_string(),
            });
        }
        Ok(quotes)
    }

    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let response = self.search(symbol).await?;
        Ok(response
            .news
            .into_iter()
            .take(self.result_limit)
            .map(|n| NewsItem {
                title: n.title,
                link: n.link,
                publisher: n.publisher,
            })
            .collect())
    }
}
