//! Internet search tool

use crate::api::WebSearch;
use crate::api::serper::render_hits;
use crate::tools::parse_params;
use async_trait::async_trait;
use crew_tools::Tool;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Searches the internet for a company and a topic
pub struct WebSearchTool {
    search: Arc<dyn WebSearch>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    company: String,
    #[serde(default)]
    query_type: Option<String>,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn WebSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: SearchParams = parse_params(self.name(), params)?;
        let query = match params.query_type.as_deref().map(str::trim) {
            Some(kind) if !kind.is_empty() => format!("{} {kind}", params.company.trim()),
            _ => params.company.trim().to_string(),
        };

        let hits = self.search.search(&query).await?;
        Ok(json!({
            "query": query,
            "results": render_hits(&query, &hits),
        }))
    }

    fn name(&self) -> &'static str {
        "search_internet"
    }

    fn description(&self) -> &'static str {
        "Search the internet about a company. Combines the company with an optional topic \
         such as 'news' or 'press release' and returns the top results as 'title: link' lines."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "company": {
                    "type": "string",
                    "description": "Company name or ticker"
                },
                "query_type": {
                    "type": "string",
                    "description": "Topic to search for, e.g. 'news', 'press release', 'earnings call'"
                }
            },
            "required": ["company"]
        })
    }
}
