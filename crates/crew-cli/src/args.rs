//! Command line arguments

use clap::{ArgAction, Parser, Subcommand};
use crew_stock::ChartKind;
use crew_stock::api::FilingType;
use crew_stock::filings_qa::FilingQuestion;
use crew_utils::{CrewMode, CrewSettings, LlmProviderKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stock-crew", version)]
#[command(about = "Research, analyze and advise on a stock with a crew of LLM agents")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Company name or ticker; asked for interactively when omitted
    pub company: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Markdown report path
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Print the report without writing a file
    #[arg(long, global = true)]
    pub no_file: bool,

    /// How agents get their data: prefetch or tools
    #[arg(long, global = true)]
    pub mode: Option<CrewMode>,

    /// LLM backend: ollama or openai
    #[arg(long, global = true)]
    pub provider: Option<LlmProviderKind>,

    /// Model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// TOML settings file (default: ./stock-crew.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// More log output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a question from a company's latest SEC filing
    Ask {
        /// "TICKER|question", e.g. "AAPL|What was last quarter's revenue?"
        query: FilingQuestion,

        /// Filing form to search
        #[arg(long, default_value = "10-Q")]
        form: FilingType,
    },

    /// Draw a one month chart of a stock
    Chart {
        /// Ticker symbol
        symbol: String,

        /// trend, moving_average or volume
        #[arg(long, default_value = "trend")]
        kind: ChartKind,
    },
}

impl Cli {
    /// Apply flag overrides on top of file and environment settings
    pub fn apply(&self, settings: &mut CrewSettings) {
        if let Some(output) = &self.output {
            settings.report.output.clone_from(output);
        }
        if self.no_file {
            settings.report.write_file = false;
        }
        if let Some(mode) = self.mode {
            settings.crew.mode = mode;
        }
        if let Some(provider) = self.provider {
            settings.llm.provider = provider;
        }
        if let Some(model) = &self.model {
            settings.llm.model.clone_from(model);
        }
    }

    /// Default tracing directive for the requested verbosity
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn,crew_stock=info",
            1 => "info,crew_stock=debug",
            _ => "debug",
        }
    }
}
