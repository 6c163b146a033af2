//! SEC filings tools: key figures, latest filing and question answering

use crate::api::{FilingSource, FilingType};
use crate::error::Result;
use crate::filings_qa::{self, FilingQuestion};
use crate::tools::parse_params;
use async_trait::async_trait;
use crew_tools::Tool;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Searches the latest 10-Q or 10-K of a company
pub struct FilingsTool {
    filings: Arc<dyn FilingSource>,
}

#[derive(Debug, Deserialize)]
struct FilingsParams {
    /// `TICKER|question`
    query: String,
    #[serde(default)]
    form: Option<String>,
}

impl FilingsTool {
    pub fn new(filings: Arc<dyn FilingSource>) -> Self {
        Self { filings }
    }

    async fn search(&self, params: FilingsParams) -> Result<Value> {
        let request: FilingQuestion = params.query.parse()?;
        let form = match params.form.as_deref() {
            Some(form) => form.parse()?,
            None => FilingType::Form10Q,
        };

        let filing = self.filings.latest_filing(&request.ticker, form).await?;
        let excerpts =
            filings_qa::answer_from(self.filings.as_ref(), &filing, &request.question).await?;
        let key_figures = self
            .filings
            .key_figures(&request.ticker)
            .await
            .map_or_else(|e| format!("data unavailable: {e}"), |k| k.summary());

        Ok(json!({
            "ticker": request.ticker,
            "filing": filing.to_string(),
            "key_figures": key_figures,
            "excerpts": excerpts,
        }))
    }
}

#[async_trait]
impl Tool for FilingsTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: FilingsParams = parse_params(self.name(), params)?;
        Ok(self.search(params).await?)
    }

    fn name(&self) -> &'static str {
        "search_filings"
    }

    fn description(&self) -> &'static str {
        "Search the latest SEC filing of a company for a question. The query is the ticker and \
         the question separated by a pipe, e.g. 'AAPL|what was last quarter's revenue'. \
         Returns the filing link, headline figures and the most relevant excerpts."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Ticker and question separated by '|'"
                },
                "form": {
                    "type": "string",
                    "description": "Filing form to search",
                    "enum": ["10-Q", "10-K"],
                    "default": "10-Q"
                }
            },
            "required": ["query"]
        })
    }
}
