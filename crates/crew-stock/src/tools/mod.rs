//! Data sources exposed as LLM-callable tools

pub mod calculator;
pub mod chart;
pub mod filings;
pub mod scrape;
pub mod search;
pub mod stock_data;

pub use calculator::CalculatorTool;
pub use chart::StockChartTool;
pub use filings::FilingsTool;
pub use scrape::{ScrapeWebsiteTool, Summarizer};
pub use search::WebSearchTool;
pub use stock_data::StockDataTool;

use crate::api::DataSources;
use crew_tools::Tool;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything needed to build the tools of any crew member
#[derive(Clone)]
pub struct ToolKit {
    pub sources: DataSources,
    /// Summarizes scraped pages when set
    pub summarizer: Option<Summarizer>,
    /// Where chart files are written
    pub chart_dir: PathBuf,
}

impl ToolKit {
    pub fn search(&self) -> Arc<dyn Tool> {
        Arc::new(WebSearchTool::new(self.sources.search.clone()))
    }

    pub fn stock_data(&self) -> Arc<dyn Tool> {
        Arc::new(StockDataTool::new(self.sources.market.clone()))
    }

    pub fn filings(&self) -> Arc<dyn Tool> {
        Arc::new(FilingsTool::new(self.sources.filings.clone()))
    }

    pub fn scrape(&self) -> Arc<dyn Tool> {
        let tool = ScrapeWebsiteTool::new(self.sources.pages.clone());
        match &self.summarizer {
            Some(summarizer) => Arc::new(tool.with_summarizer(summarizer.clone())),
            None => Arc::new(tool),
        }
    }

    pub fn calculator(&self) -> Arc<dyn Tool> {
        Arc::new(CalculatorTool)
    }

    pub fn chart(&self) -> Arc<dyn Tool> {
        Arc::new(StockChartTool::new(
            self.sources.market.clone(),
            self.chart_dir.clone(),
        ))
    }
}

/// Deserialize tool input, reporting schema mismatches as invalid input
pub(crate) fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> crew_core::Result<T> {
    serde_json::from_value(params)
        .map_err(|e| crew_core::Error::InvalidInput(format!("{tool}: invalid parameters: {e}")))
}
