//! Data gathered ahead of each task in prefetch mode
//!
//! Every source is fetched independently. A failed source is rendered as
//! `data unavailable: <reason>` so the task still runs on whatever remains.

use crate::api::serper::render_hits;
use crate::api::{CompanyProfile, DataSources, FilingType, Quote};
use crate::error::StockError;
use crate::filings_qa;
use crate::report::StockPerformance;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, warn};

/// Question used to pick filing excerpts for the filings task
const FILINGS_FOCUS: &str = "net sales revenue net income earnings per share operating \
expenses cash debt liquidity risk factors outlook insider";

/// Which data a task is briefed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Briefing {
    /// News and press release searches plus headlines
    Research,
    /// Company profile, latest quote and one month of prices
    Financials,
    /// Latest 10-Q and 10-K, key figures and filing excerpts
    Filings,
    /// One month price trend and chart
    Performance,
}

/// Result of gathering a briefing
#[derive(Debug, Clone)]
pub struct Gathered {
    /// Markdown appended to the task prompt
    pub text: String,
    /// Set by [`Briefing::Performance`]
    pub performance: Option<StockPerformance>,
}

fn section<E: std::fmt::Display>(out: &mut String, title: &str, result: std::result::Result<String, E>) {
    let body = match result {
        Ok(text) => text,
        Err(e) => {
            warn!(section = title, error = %e, "Source failed");
            format!("data unavailable: {e}")
        }
    };
    let _ = write!(out, "### {title}\n{}\n\n", body.trim());
}

fn quote_line(q: &Quote) -> String {
    format!(
        "{}: open {:.2}, high {:.2}, low {:.2}, close {:.2}, volume {}",
        q.timestamp.format("%Y-%m-%d"),
        q.open,
        q.high,
        q.low,
        q.close,
        q.volume
    )
}

fn history_table(quotes: &[Quote]) -> String {
    let mut out = String::from("| Date | Open | High | Low | Close | Volume |\n|---|---|---|---|---|---|\n");
    for q in quotes {
        let _ = writeln!(
            out,
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {} |",
            q.timestamp.format("%Y-%m-%d"),
            q.open,
            q.high,
            q.low,
            q.close,
            q.volume
        );
    }
    out
}

impl Briefing {
    /// Fetch and render this briefing for a resolved company
    pub async fn gather(
        &self,
        sources: &DataSources,
        profile: &CompanyProfile,
        company: &str,
        chart_dir: Option<&Path>,
    ) -> Gathered {
        let symbol = profile.symbol.as_str();
        debug!(briefing = ?self, symbol, company, "Gathering data");
        let mut text = String::new();
        let mut performance = None;

        match self {
            Briefing::Research => {
                for (title, topic) in [("News", "news"), ("Press Releases", "press release")] {
                    let query = format!("{company} {topic}");
                    let hits = sources.search.search(&query).await;
                    section(&mut text, title, hits.map(|h| render_hits(&query, &h)));
                }
                let headlines = sources.market.news(symbol).await.map(|news| {
                    if news.is_empty() {
                        return format!("No headlines found for {symbol}.");
                    }
                    news.iter()
                        .map(|n| format!("{}: {}", n.title, n.link))
                        .collect::<Vec<_>>()
                        .join("\n")
                });
                section(&mut text, "Yahoo Finance Headlines", headlines);
            }
            Briefing::Financials => {
                section(&mut text, "Company Info", Ok::<_, StockError>(profile.summary()));
                let quote = sources.market.quote(symbol).await;
                section(&mut text, "Latest Quote", quote.map(|q| quote_line(&q)));
                let history = sources.market.month_history(symbol).await;
                section(&mut text, "Historical Data (1 Month)", history.map(|h| history_table(&h)));
            }
            Briefing::Filings => {
                let quarterly = sources.filings.latest_filing(symbol, FilingType::Form10Q).await;
                section(
                    &mut text,
                    "Latest 10-Q Filing",
                    quarterly.as_ref().map(ToString::to_string),
                );
                let annual = sources.filings.latest_filing(symbol, FilingType::Form10K).await;
                section(&mut text, "Latest 10-K Filing", annual.map(|f| f.to_string()));

                let figures = sources.filings.key_figures(symbol).await;
                section(&mut text, "Key Figures", figures.map(|k| k.summary()));

                // Excerpts come from the 10-Q fetched above
                let excerpts = match quarterly {
                    Ok(filing) => {
                        filings_qa::answer_from(sources.filings.as_ref(), &filing, FILINGS_FOCUS).await
                    }
                    Err(e) => Err(e),
                };
                section(&mut text, "Quarterly Report Excerpts", excerpts);
            }
            Briefing::Performance => {
                let measured = StockPerformance::measure(sources.market.as_ref(), symbol, chart_dir).await;
                let mut body = measured.briefing();
                if let Some(chart) = &measured.chart {
                    let _ = write!(body, "\nTrend chart: {}", chart.display());
                }
                section(&mut text, "Stock Performance (1 Month)", Ok::<_, StockError>(body));
                performance = Some(measured);
            }
        }

        Gathered {
            text: text.trim_end().to_string(),
            performance,
        }
    }
}
