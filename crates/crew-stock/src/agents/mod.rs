//! Crew members and the per-task agent wrapper
//!
//! A [`StockAgent`] binds one crew member to one task. In prefetch mode it
//! gathers the task's [`Briefing`] and appends it to the prompt before the
//! single LLM call; in tools mode it passes the prompt straight through to a
//! tool-calling agent.

pub mod briefing;
pub mod roles;

pub use briefing::{Briefing, Gathered};
pub use roles::Role;

use crate::api::{CompanyProfile, DataSources};
use crate::prompts::AgentProfile;
use async_trait::async_trait;
use crew_core::{Agent, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Keys this crate stores in the run [`Context`]
pub mod keys {
    /// Resolved [`CompanyProfile`](crate::api::CompanyProfile)
    pub const PROFILE: &str = "stock.profile";
    /// Measured [`StockPerformance`](crate::report::StockPerformance)
    pub const PERFORMANCE: &str = "stock.performance";
}

/// One crew member working on one task
pub struct StockAgent {
    profile: &'static AgentProfile,
    inner: Arc<dyn Agent>,
    briefing: Option<(Briefing, DataSources)>,
    chart_dir: Option<PathBuf>,
}

impl StockAgent {
    /// Wrap a member that gets its data through tools
    pub fn new(profile: &'static AgentProfile, inner: Arc<dyn Agent>) -> Self {
        Self {
            profile,
            inner,
            briefing: None,
            chart_dir: None,
        }
    }

    /// Gather `briefing` from `sources` before every call
    pub fn with_briefing(mut self, briefing: Briefing, sources: DataSources) -> Self {
        self.briefing = Some((briefing, sources));
        self
    }

    /// Directory for charts drawn while briefing
    pub fn with_chart_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.chart_dir = dir;
        self
    }
}

#[async_trait]
impl Agent for StockAgent {
    #[instrument(skip_all, fields(agent = self.profile.name))]
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let Some((briefing, sources)) = &self.briefing else {
            return self.inner.process(input, context).await;
        };

        let company = context.company().unwrap_or_default().to_string();
        let profile = context
            .get_typed::<CompanyProfile>(keys::PROFILE)?
            .unwrap_or_else(|| CompanyProfile::bare(company.as_str()));

        let gathered = briefing
            .gather(sources, &profile, &company, self.chart_dir.as_deref())
            .await;
        debug!(briefing = ?briefing, data_length = gathered.text.len(), "Briefing ready");

        if let Some(performance) = &gathered.performance {
            context.insert_typed(keys::PERFORMANCE, performance)?;
        }

        let prompt = format!("{input}\n\n## Data gathered for this task\n\n{}", gathered.text);
        self.inner.process(prompt, context).await
    }

    fn name(&self) -> &str {
        self.profile.name
    }

    fn role(&self) -> &str {
        self.profile.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        FilingSource, FilingType, KeyFigures, MarketData, NewsItem, PageFetcher, Quote, SearchHit,
        SecFiling, WebSearch,
    };
    use crate::error::{Result as StockResult, StockError};
    use crate::prompts::INVESTMENT_ADVISOR;
    use crate::report::StockPerformance;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Records the prompt it was given
    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Agent for Recorder {
        async fn process(&self, input: String, _context: &mut Context) -> Result<String> {
            self.prompts.lock().unwrap().push(input);
            Ok("done".to_string())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    struct Offline;

    #[async_trait]
    impl WebSearch for Offline {
        async fn search(&self, _query: &str) -> StockResult<Vec<SearchHit>> {
            Err(StockError::MissingApiKey("SERPER_API_KEY"))
        }
    }

    #[async_trait]
    impl MarketData for Offline {
        async fn resolve(&self, query: &str) -> StockResult<CompanyProfile> {
            Ok(CompanyProfile::bare(query))
        }

        async fn quote(&self, symbol: &str) -> StockResult<Quote> {
            Err(StockError::InvalidSymbol(symbol.to_string()))
        }

        async fn month_history(&self, symbol: &str) -> StockResult<Vec<Quote>> {
            Ok([10.0, 9.0]
                .into_iter()
                .map(|close| Quote {
                    symbol: symbol.to_string(),
                    timestamp: Utc::now(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1,
                    adjclose: close,
                })
                .collect())
        }

        async fn news(&self, _symbol: &str) -> StockResult<Vec<NewsItem>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl FilingSource for Offline {
        async fn latest_filing(&self, ticker: &str, _form: FilingType) -> StockResult<SecFiling> {
            Err(StockError::InvalidSymbol(ticker.to_string()))
        }

        async fn key_figures(&self, ticker: &str) -> StockResult<KeyFigures> {
            Err(StockError::InvalidSymbol(ticker.to_string()))
        }

        async fn document_text(&self, _filing: &SecFiling) -> StockResult<String> {
            Ok(String::new())
        }
    }

    #[async_trait]
    impl PageFetcher for Offline {
        async fn fetch_text(&self, _url: &str) -> StockResult<String> {
            Ok(String::new())
        }
    }

    fn sources() -> DataSources {
        let offline = Arc::new(Offline);
        DataSources {
            search: offline.clone(),
            market: offline.clone(),
            filings: offline.clone(),
            pages: offline,
        }
    }

    #[tokio::test]
    async fn test_passthrough_without_briefing() {
        let inner = Arc::new(Recorder::default());
        let agent = StockAgent::new(&INVESTMENT_ADVISOR, inner.clone());

        let mut ctx = Context::new().with_company("Apple");
        agent.process("task".to_string(), &mut ctx).await.unwrap();

        assert_eq!(*inner.prompts.lock().unwrap(), vec!["task"]);
        assert_eq!(agent.name(), "investment_advisor");
        assert_eq!(agent.role(), "Private Investment Advisor");
    }

    #[tokio::test]
    async fn test_briefing_uses_resolved_symbol_and_stores_performance() {
        let inner = Arc::new(Recorder::default());
        let agent = StockAgent::new(&INVESTMENT_ADVISOR, inner.clone())
            .with_briefing(Briefing::Performance, sources());

        let mut ctx = Context::new().with_company("Apple");
        ctx.insert_typed(keys::PROFILE, &CompanyProfile::bare("AAPL")).unwrap();
        agent.process("task".to_string(), &mut ctx).await.unwrap();

        let prompt = inner.prompts.lock().unwrap()[0].clone();
        assert!(prompt.starts_with("task\n\n## Data gathered for this task\n\n"));
        assert!(prompt.contains("Symbol: AAPL"));

        let perf: StockPerformance = ctx.get_typed(keys::PERFORMANCE).unwrap().unwrap();
        assert_eq!(perf.symbol, "AAPL");
        assert!((perf.change_percent.unwrap() + 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_sources_do_not_abort() {
        let inner = Arc::new(Recorder::default());
        let agent = StockAgent::new(&INVESTMENT_ADVISOR, inner.clone())
            .with_briefing(Briefing::Research, sources());

        let mut ctx = Context::new().with_company("Apple");
        let out = agent.process("task".to_string(), &mut ctx).await.unwrap();

        assert_eq!(out, "done");
        let prompt = inner.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("### News\ndata unavailable: Missing API key"));
    }
}
