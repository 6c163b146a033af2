//! Tool for fetching stock prices, company info and headlines

use crate::api::{MarketData, Quote};
use crate::error::{Result, StockError};
use crate::tools::parse_params;
use async_trait::async_trait;
use crew_tools::Tool;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Tool for fetching Yahoo Finance data
pub struct StockDataTool {
    market: Arc<dyn MarketData>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DataKind {
    #[default]
    Quote,
    Historical,
    CompanyInfo,
    News,
}

#[derive(Debug, Deserialize)]
struct StockDataParams {
    symbol: String,
    #[serde(default)]
    data_type: DataKind,
}

fn quote_json(q: &Quote) -> Value {
    json!({
        "date": q.timestamp.format("%Y-%m-%d").to_string(),
        "open": q.open,
        "high": q.high,
        "low": q.low,
        "close": q.close,
        "volume": q.volume,
        "adjusted_close": q.adjclose,
    })
}

impl StockDataTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    async fn fetch(&self, params: StockDataParams) -> Result<Value> {
        let symbol = params.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(StockError::InvalidInput("symbol must not be empty".to_string()));
        }

        let data = match params.data_type {
            DataKind::Quote => quote_json(&self.market.quote(&symbol).await?),
            DataKind::Historical => {
                let history = self.market.month_history(&symbol).await?;
                json!({
                    "range": "1mo",
                    "data_points": history.len(),
                    "quotes": history.iter().map(quote_json).collect::<Vec<_>>(),
                })
            }
            DataKind::CompanyInfo => {
                let profile = self.market.resolve(&symbol).await?;
                json!({ "summary": profile.summary(), "profile": profile })
            }
            DataKind::News => {
                let news = self.market.news(&symbol).await?;
                json!(news)
            }
        };

        Ok(json!({ "symbol": symbol, "data": data }))
    }
}

#[async_trait]
impl Tool for StockDataTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: StockDataParams = parse_params(self.name(), params)?;
        Ok(self.fetch(params).await?)
    }

    fn name(&self) -> &'static str {
        "stock_data"
    }

    fn description(&self) -> &'static str {
        "Fetch Yahoo Finance data for a stock ticker: the latest quote, one month of daily \
         prices, company information or recent news headlines."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Stock ticker symbol (e.g., 'AAPL', 'RELIANCE.NS')"
                },
                "data_type": {
                    "type": "string",
                    "description": "Which data to fetch",
                    "enum": ["quote", "historical", "company_info", "news"],
                    "default": "quote"
                }
            },
            "required": ["symbol"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompanyProfile, NewsItem};
    use chrono::{TimeZone, Utc};

    struct FakeMarket;

    fn quote(close: f64) -> Quote {
        Quote {
            symbol: "MSFT".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 9, 30, 20, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
            adjclose: close,
        }
    }

    #[async_trait]
    impl MarketData for FakeMarket {
        async fn resolve(&self, query: &str) -> Result<CompanyProfile> {
            Ok(CompanyProfile {
                name: Some("Microsoft Corporation".to_string()),
                ..CompanyProfile::bare(query)
            })
        }

        async fn quote(&self, _symbol: &str) -> Result<Quote> {
            Ok(quote(430.3))
        }

        async fn month_history(&self, _symbol: &str) -> Result<Vec<Quote>> {
            Ok(vec![quote(410.0), quote(430.3)])
        }

        async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
            Err(StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no headlines".to_string(),
            })
        }
    }

    fn tool() -> StockDataTool {
        StockDataTool::new(Arc::new(FakeMarket))
    }

    #[tokio::test]
    async fn test_default_is_quote() {
        let out = tool().execute(json!({ "symbol": "msft" })).await.unwrap();
        assert_eq!(out["symbol"], "MSFT");
        assert_eq!(out["data"]["close"], 430.3);
        assert_eq!(out["data"]["date"], "2024-09-30");
    }

    #[tokio::test]
    async fn test_historical_and_company_info() {
        let out = tool()
            .execute(json!({ "symbol": "MSFT", "data_type": "historical" }))
            .await
            .unwrap();
        assert_eq!(out["data"]["data_points"], 2);

        let out = tool()
            .execute(json!({ "symbol": "MSFT", "data_type": "company_info" }))
            .await
            .unwrap();
        let summary = out["data"]["summary"].as_str().unwrap();
        assert!(summary.contains("Company: Microsoft Corporation"));
        assert!(summary.contains("P/E Ratio: N/A"));
    }

    #[tokio::test]
    async fn test_errors() {
        assert!(tool().execute(json!({ "symbol": "  " })).await.is_err());
        assert!(
            tool()
                .execute(json!({ "symbol": "MSFT", "data_type": "options" }))
                .await
                .is_err()
        );
        let err = tool()
            .execute(json!({ "symbol": "MSFT", "data_type": "news" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no headlines"));
    }
}
