//! Website scraping tool

use crate::api::scrape::{SUMMARY_CHUNK_CHARS, summarize_text};
use crate::api::{PageFetcher, truncate};
use crate::error::Result;
use crate::tools::parse_params;
use async_trait::async_trait;
use crew_llm::LLMProvider;
use crew_tools::Tool;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// LLM settings used to summarize scraped pages
#[derive(Clone)]
pub struct Summarizer {
    pub provider: Arc<dyn LLMProvider>,
    pub model: String,
    pub max_tokens: usize,
}

/// Scrapes a page and returns its text, optionally summarized
pub struct ScrapeWebsiteTool {
    pages: Arc<dyn PageFetcher>,
    summarizer: Option<Summarizer>,
}

#[derive(Debug, Deserialize)]
struct ScrapeParams {
    url: String,
    #[serde(default = "default_summarize")]
    summarize: bool,
}

fn default_summarize() -> bool {
    true
}

impl ScrapeWebsiteTool {
    pub fn new(pages: Arc<dyn PageFetcher>) -> Self {
        Self {
            pages,
            summarizer: None,
        }
    }

    /// Summarize pages with an LLM before returning them
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    async fn scrape(&self, params: ScrapeParams) -> Result<Value> {
        let text = self.pages.fetch_text(&params.url).await?;

        let (content, summarized) = match (&self.summarizer, params.summarize) {
            (Some(s), true) => (
                summarize_text(s.provider.as_ref(), &s.model, s.max_tokens, &text).await?,
                true,
            ),
            _ => (truncate(&text, SUMMARY_CHUNK_CHARS), false),
        };

        Ok(json!({
            "url": params.url,
            "summarized": summarized,
            "content": content,
        }))
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: ScrapeParams = parse_params(self.name(), params)?;
        Ok(self.scrape(params).await?)
    }

    fn name(&self) -> &'static str {
        "scrape_website"
    }

    fn description(&self) -> &'static str {
        "Scrape a website and return its readable content, summarized when possible. \
         Use it on links found by the search tool."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full http(s) URL of the page"
                },
                "summarize": {
                    "type": "boolean",
                    "description": "Summarize the page instead of returning raw text",
                    "default": true
                }
            },
            "required": ["url"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_llm::{CompletionRequest, CompletionResponse, Message, StopReason, TokenUsage};
    use mockall::mock;

    mock! {
        Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(&self, request: CompletionRequest) -> crew_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    struct FixedPage(String);

    #[async_trait]
    impl PageFetcher for FixedPage {
        async fn fetch_text(&self, _url: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_raw_text_is_truncated() {
        let tool = ScrapeWebsiteTool::new(Arc::new(FixedPage("x".repeat(SUMMARY_CHUNK_CHARS + 10))));
        let out = tool
            .execute(json!({ "url": "https://example.com" }))
            .await
            .unwrap();
        assert_eq!(out["summarized"], false);
        assert!(out["content"].as_str().unwrap().ends_with("..."));
    }

    #[tokio::test]
    async fn test_summarized_per_chunk() {
        let mut provider = MockProvider::new();
        provider.expect_complete().times(2).returning(|request| {
            assert!(request.system.as_deref().unwrap_or_default().contains("Principal Researcher"));
            Ok(CompletionResponse {
                message: Message::assistant("summary"),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        });

        let tool = ScrapeWebsiteTool::new(Arc::new(FixedPage("y".repeat(SUMMARY_CHUNK_CHARS + 1))))
            .with_summarizer(Summarizer {
                provider: Arc::new(provider),
                model: "mistral".to_string(),
                max_tokens: 512,
            });

        let out = tool
            .execute(json!({ "url": "https://example.com" }))
            .await
            .unwrap();
        assert_eq!(out["summarized"], true);
        assert_eq!(out["content"], "summary\n\nsummary");
    }
}
