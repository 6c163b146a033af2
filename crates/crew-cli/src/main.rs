//! `stock-crew` command-line interface
//!
//! ```bash
//! # Analyze a company with a local Ollama model
//! stock-crew "NVIDIA"
//!
//! # OpenAI-compatible server, tool-calling agents, no report file
//! stock-crew TSLA --provider openai --mode tools --no-file
//!
//! # Ask a filing question or draw a chart
//! stock-crew ask "AAPL|What was last quarter's revenue?"
//! stock-crew chart AAPL --kind moving_average
//! ```

mod args;

use anyhow::{Context as _, bail};
use args::{Cli, Command};
use clap::Parser;
use crew_llm::LLMProvider;
use crew_llm::providers::{OllamaConfig, OllamaProvider, OpenAIConfig, OpenAIProvider};
use crew_stock::api::FilingType;
use crew_stock::chart::write_chart;
use crew_stock::filings_qa::{self, FilingQuestion};
use crew_stock::recommendation::price_change_percent;
use crew_stock::{ChartKind, DataSources, StockAnalysisCrew, StockConfig};
use crew_utils::{CrewSettings, LlmProviderKind, LlmSection, LogFormat, init_tracing};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;

fn print_banner() {
    println!("## Welcome to the Financial Analysis Crew");
    println!("-------------------------------");
}

/// Ask for the company on stdin
fn prompt_company() -> anyhow::Result<String> {
    print!("What is the company you want to analyze?\n> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let company = line.trim();
    if company.is_empty() {
        bail!("no company given");
    }
    Ok(company.to_string())
}

fn build_provider(llm: &LlmSection) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match llm.provider {
        LlmProviderKind::Ollama => {
            let mut config = OllamaConfig::default().with_timeout(llm.timeout_secs);
            if let Some(base_url) = llm.endpoint() {
                config = config.with_base_url(base_url);
            }
            Arc::new(OllamaProvider::with_config(config)?)
        }
        LlmProviderKind::OpenAi => {
            // Local OpenAI-compatible servers accept any key
            let key = llm.api_key.clone().unwrap_or_else(|| "not-needed".to_string());
            let mut config = OpenAIConfig::new(key).with_timeout(llm.timeout_secs);
            if let Some(base_url) = llm.endpoint() {
                config = config.with_api_base(base_url);
            }
            Arc::new(OpenAIProvider::with_config(config)?)
        }
    };
    Ok(provider)
}

async fn analyze(settings: &CrewSettings, company: Option<String>) -> anyhow::Result<()> {
    print_banner();
    let company = match company {
        Some(company) => company,
        None => prompt_company()?,
    };

    let config = StockConfig::from_settings(settings)?;
    let report_path = config.report_path.clone();
    let provider = build_provider(&settings.llm)?;
    info!(
        provider = provider.name(),
        model = %settings.llm.model,
        mode = ?settings.crew.mode,
        "LLM provider ready"
    );

    let crew = StockAnalysisCrew::from_provider(provider, config)?;
    let report = crew
        .produce_report(&company)
        .await
        .with_context(|| format!("analysis of '{company}' failed"))?;

    println!("\n\n########################");
    println!("## Here is the Report");
    println!("########################\n");
    println!("{report}");

    if let Some(path) = report_path {
        println!("\nReport saved to {}", path.display());
    }
    Ok(())
}

async fn ask(settings: &CrewSettings, question: &FilingQuestion, form: FilingType) -> anyhow::Result<()> {
    let config = StockConfig::from_settings(settings)?;
    let sources = DataSources::from_config(&config)?;

    let excerpts = filings_qa::answer(sources.filings.as_ref(), question, form).await?;
    println!("{excerpts}");
    Ok(())
}

async fn chart(settings: &CrewSettings, symbol: &str, kind: ChartKind) -> anyhow::Result<()> {
    let config = StockConfig::from_settings(settings)?;
    let sources = DataSources::from_config(&config)?;

    let history = sources.market.month_history(symbol).await?;
    let path = write_chart(&config.chart_dir, symbol, kind, &history)?;

    println!("Chart saved to {}", path.display());
    if let Some(change) = price_change_percent(&history) {
        println!("Price change (1 month): {change:.2}%");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, cli.log_directive());

    let mut settings = CrewSettings::resolve(cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate()?;

    match &cli.command {
        Some(Command::Ask { query, form }) => ask(&settings, query, *form).await,
        Some(Command::Chart { symbol, kind }) => chart(&settings, symbol, *kind).await,
        None => analyze(&settings, cli.company.clone()).await,
    }
}
