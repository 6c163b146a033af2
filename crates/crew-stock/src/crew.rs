//! Assembly and execution of the stock analysis crew

use crate::agents::{Briefing, Role, StockAgent, keys};
use crate::api::{CompanyProfile, DataSources};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::prompts::StockTask;
use crate::report::{Report, StockPerformance};
use crate::tools::{Summarizer, ToolKit};
use chrono::Local;
use crew_core::{Agent, Context};
use crew_llm::LLMProvider;
use crew_runtime::AgentRuntime;
use crew_utils::CrewMode;
use crew_workflow::{Crew, Task};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Who works on a task and with which data
pub fn staffing(task: StockTask) -> (Role, Briefing) {
    match task {
        StockTask::Research => (Role::ResearchAnalyst, Briefing::Research),
        StockTask::FinancialAnalysis => (Role::FinancialAnalyst, Briefing::Financials),
        StockTask::FilingsAnalysis => (Role::FinancialAnalyst, Briefing::Filings),
        StockTask::Recommend => (Role::InvestmentAdvisor, Briefing::Performance),
    }
}

/// Researcher, financial analyst and investment advisor producing a report
///
/// ```no_run
/// use crew_stock::{DataSources, StockAnalysisCrew, StockConfig};
/// use crew_runtime::AgentRuntime;
/// use std::sync::Arc;
/// # async fn example(runtime: Arc<AgentRuntime>) -> crew_stock::Result<()> {
/// let config = Arc::new(StockConfig::default());
/// let sources = DataSources::from_config(&config)?;
/// let crew = StockAnalysisCrew::new(runtime, sources, config);
///
/// let report = crew.produce_report("Tesla").await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct StockAnalysisCrew {
    runtime: Arc<AgentRuntime>,
    sources: DataSources,
    config: Arc<StockConfig>,
}

impl StockAnalysisCrew {
    pub fn new(runtime: Arc<AgentRuntime>, sources: DataSources, config: Arc<StockConfig>) -> Self {
        Self {
            runtime,
            sources,
            config,
        }
    }

    /// Crew over live data sources with a runtime built from `config`
    pub fn from_provider(provider: Arc<dyn LLMProvider>, config: StockConfig) -> Result<Self> {
        config.validate()?;
        let sources = DataSources::from_config(&config)?;
        let runtime = Arc::new(AgentRuntime::new(provider, config.runtime_config()));
        Ok(Self::new(runtime, sources, Arc::new(config)))
    }

    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    /// Charts are only written alongside a report file
    fn chart_dir(&self) -> Option<PathBuf> {
        self.config
            .report_path
            .as_ref()
            .map(|_| self.config.chart_dir.clone())
    }

    fn tool_kit(&self) -> ToolKit {
        ToolKit {
            sources: self.sources.clone(),
            summarizer: Some(Summarizer {
                provider: self.runtime.provider().clone(),
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
            }),
            chart_dir: self.config.chart_dir.clone(),
        }
    }

    /// Build the task graph for one company
    pub fn assemble(&self, company: &str, today: &str) -> Result<Crew> {
        let mode = self.config.mode;
        let kit = self.tool_kit();

        let mut members: Vec<(Role, Arc<dyn Agent>)> = Vec::with_capacity(3);
        for role in [
            Role::ResearchAnalyst,
            Role::FinancialAnalyst,
            Role::InvestmentAdvisor,
        ] {
            members.push((role, role.build(&self.runtime, mode, &kit)?));
        }

        let mut builder = Crew::builder();
        for task in StockTask::ALL {
            let (role, briefing) = staffing(task);
            let member = members
                .iter()
                .find(|(r, _)| *r == role)
                .map(|(_, agent)| agent.clone())
                .ok_or_else(|| StockError::Other(format!("no crew member for {task}")))?;

            let mut agent = StockAgent::new(role.profile(), member);
            if mode == CrewMode::Prefetch {
                agent = agent
                    .with_briefing(briefing, self.sources.clone())
                    .with_chart_dir(self.chart_dir());
            }

            let prompt = task.prompt(company, today)?;
            let mut step = Task::new(task.name(), Arc::new(agent))
                .description(prompt.description)
                .expected_output(prompt.expected_output);
            for dep in task.dependencies() {
                step = step.depends_on(dep.name());
            }
            builder = builder.add_task(step);
        }

        Ok(builder.build()?)
    }

    /// Run the whole pipeline for a company name or ticker
    ///
    /// Data source failures are described to the agents; an LLM failure
    /// aborts the run. The report is written to the configured path, if any.
    #[instrument(skip(self), fields(mode = ?self.config.mode))]
    pub async fn produce_report(&self, query: &str) -> Result<Report> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StockError::InvalidInput(
                "company name or ticker must not be empty".to_string(),
            ));
        }

        let today = Local::now().format("%Y-%m-%d").to_string();
        let run_id = Uuid::new_v4().to_string();

        let profile = match self.sources.market.resolve(query).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(query, error = %e, "Could not resolve ticker, using the query as symbol");
                CompanyProfile::bare(query)
            }
        };
        info!(query, symbol = %profile.symbol, run_id = %run_id, "Starting stock analysis");

        let crew = self.assemble(query, &today)?;
        let mut context = Context::new()
            .with_company(query)
            .with_today(today)
            .with_run_id(run_id);
        context.insert_typed(keys::PROFILE, &profile)?;

        let output = crew.kickoff(&mut context).await?;

        let performance = match context.get_typed::<StockPerformance>(keys::PERFORMANCE)? {
            Some(performance) => performance,
            None => {
                StockPerformance::measure(
                    self.sources.market.as_ref(),
                    &profile.symbol,
                    self.chart_dir().as_deref(),
                )
                .await
            }
        };

        let report = Report::new(query, &output, performance);
        if let Some(path) = &self.config.report_path {
            report.write_to(path)?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        FilingSource, FilingType, KeyFigures, MarketData, NewsItem, PageFetcher, Quote, SearchHit,
        SecFiling, WebSearch,
    };
    use async_trait::async_trait;
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

    struct NoData;

    #[async_trait]
    impl WebSearch for NoData {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl MarketData for NoData {
        async fn resolve(&self, query: &str) -> Result<CompanyProfile> {
            Err(StockError::InvalidSymbol(query.to_string()))
        }

        async fn quote(&self, symbol: &str) -> Result<Quote> {
            Err(StockError::InvalidSymbol(symbol.to_string()))
        }

        async fn month_history(&self, symbol: &str) -> Result<Vec<Quote>> {
            Err(StockError::InvalidSymbol(symbol.to_string()))
        }

        async fn news(&self, _symbol: &str) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl FilingSource for NoData {
        async fn latest_filing(&self, ticker: &str, _form: FilingType) -> Result<SecFiling> {
            Err(StockError::InvalidSymbol(ticker.to_string()))
        }

        async fn key_figures(&self, ticker: &str) -> Result<KeyFigures> {
            Err(StockError::InvalidSymbol(ticker.to_string()))
        }

        async fn document_text(&self, _filing: &SecFiling) -> Result<String> {
            Ok(String::new())
        }
    }

    #[async_trait]
    impl PageFetcher for NoData {
        async fn fetch_text(&self, _url: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn crew(provider: MockProvider, mode: CrewMode) -> StockAnalysisCrew {
        let config = StockConfig::builder()
            .mode(mode)
            .report_path(None)
            .build()
            .unwrap();
        let runtime = Arc::new(AgentRuntime::new(Arc::new(provider), config.runtime_config()));
        let no_data = Arc::new(NoData);
        let sources = DataSources {
            search: no_data.clone(),
            market: no_data.clone(),
            filings: no_data.clone(),
            pages: no_data,
        };
        StockAnalysisCrew::new(runtime, sources, Arc::new(config))
    }

    fn reply(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    #[test]
    fn test_staffing() {
        assert_eq!(staffing(StockTask::Research).0, Role::ResearchAnalyst);
        assert_eq!(staffing(StockTask::FilingsAnalysis), (Role::FinancialAnalyst, Briefing::Filings));
        assert_eq!(staffing(StockTask::Recommend).1, Briefing::Performance);
    }

    #[test]
    fn test_assemble_orders_tasks() {
        let crew = crew(MockProvider::new(), CrewMode::Prefetch);
        let assembled = crew.assemble("Apple", "2024-09-30").unwrap();
        assert_eq!(
            assembled.execution_order(),
            vec!["research", "financial_analysis", "filings_analysis", "recommend"]
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let crew = crew(MockProvider::new(), CrewMode::Prefetch);
        let err = crew.produce_report("   ").await.unwrap_err();
        assert!(matches!(err, StockError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_llm_failure_aborts_the_run() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_| Err(crew_llm::LLMError::RequestFailed("connection refused".to_string())));

        let err = crew(provider, CrewMode::Prefetch)
            .produce_report("Apple")
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::WorkflowError(_)));
    }

    #[tokio::test]
    async fn test_report_without_market_data() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(4)
            .returning(|request| Ok(reply(&format!("answer {}", request.messages.len()))));

        let report = crew(provider, CrewMode::Prefetch)
            .produce_report(" Apple ")
            .await
            .unwrap();

        assert_eq!(report.query, "Apple");
        assert_eq!(report.symbol, "Apple");
        assert_eq!(report.advice, "answer 1");
        assert!(report.performance.unavailable.is_some());
        assert!(report.to_markdown().contains("Insufficient data"));
    }
}
