//! Stock analysis crew
//!
//! Three LLM-backed crew members work through a fixed task graph and turn a
//! company name or ticker into an investment recommendation report:
//!
//! - `research`: news and press releases (Serper web search, Yahoo headlines)
//! - `financial_analysis`: company info, latest quote and one month of prices
//!   (Yahoo Finance)
//! - `filings_analysis`: latest 10-Q and 10-K, XBRL key figures and filing
//!   excerpts (SEC EDGAR, sec-api.io)
//! - `recommend`: one month price trend, SVG chart and the final advice
//!
//! Each task sees the outputs of the tasks it depends on. In prefetch mode
//! (the default) data is fetched before a single LLM call per task; in tools
//! mode the members call the data sources as tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use crew_stock::{StockAnalysisCrew, StockConfig};
//! use crew_llm::providers::{OllamaConfig, OllamaProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(OllamaProvider::with_config(OllamaConfig::default())?);
//!     let crew = StockAnalysisCrew::from_provider(provider, StockConfig::default())?;
//!
//!     let report = crew.produce_report("NVIDIA").await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod api;
pub mod chart;
pub mod config;
pub mod crew;
pub mod error;
pub mod filings_qa;
pub mod prompts;
pub mod recommendation;
pub mod report;
pub mod retry;
pub mod tools;

pub use api::{DataSources, FilingSource, MarketData, PageFetcher, WebSearch};
pub use chart::ChartKind;
pub use config::StockConfig;
pub use crew::StockAnalysisCrew;
pub use error::{Result, StockError};
pub use recommendation::{Recommendation, Verdict};
pub use report::{Report, StockPerformance};
pub use retry::RetryPolicy;
