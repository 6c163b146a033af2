//! Stock chart tool

use crate::api::MarketData;
use crate::chart::{ChartKind, write_chart};
use crate::error::Result;
use crate::recommendation::price_change_percent;
use crate::tools::parse_params;
use async_trait::async_trait;
use crew_tools::Tool;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

/// Draws a one month chart of a stock and saves it as SVG
pub struct StockChartTool {
    market: Arc<dyn MarketData>,
    output_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ChartParams {
    symbol: String,
    #[serde(default)]
    kind: Option<String>,
}

impl StockChartTool {
    pub fn new(market: Arc<dyn MarketData>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            market,
            output_dir: output_dir.into(),
        }
    }

    async fn draw(&self, params: ChartParams) -> Result<Value> {
        let kind = match params.kind.as_deref() {
            Some(kind) => kind.parse()?,
            None => ChartKind::Trend,
        };
        let symbol = params.symbol.trim().to_uppercase();

        let history = self.market.month_history(&symbol).await?;
        let path = write_chart(&self.output_dir, &symbol, kind, &history)?;

        Ok(json!({
            "symbol": symbol,
            "kind": kind.as_str(),
            "path": path.display().to_string(),
            "price_change_percent": price_change_percent(&history),
        }))
    }
}

#[async_trait]
impl Tool for StockChartTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: ChartParams = parse_params(self.name(), params)?;
        Ok(self.draw(params).await?)
    }

    fn name(&self) -> &'static str {
        "stock_chart"
    }

    fn description(&self) -> &'static str {
        "Draw a one month chart of a stock (price trend, moving averages or volume), save it \
         as an SVG file and return its path along with the price change in percent."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "kind": {
                    "type": "string",
                    "enum": ["trend", "moving_average", "volume"],
                    "default": "trend"
                }
            },
            "required": ["symbol"]
        })
    }
}
