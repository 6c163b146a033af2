//! Report assembly and output

use crate::api::MarketData;
use crate::chart::{ChartKind, write_chart};
use crate::error::Result;
use crate::prompts::StockTask;
use crate::recommendation::{Verdict, price_change_percent, recommend};
use crew_workflow::CrewOutput;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// One month of price movement for the recommendation section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockPerformance {
    pub symbol: String,
    pub first_close: Option<f64>,
    pub last_close: Option<f64>,
    pub change_percent: Option<f64>,
    /// Number of daily samples
    pub points: usize,
    /// Trend chart, when one was written
    pub chart: Option<PathBuf>,
    /// Why the history could not be used
    pub unavailable: Option<String>,
}

impl StockPerformance {
    /// Fetch the last month of prices and optionally draw the trend chart
    ///
    /// Never fails: a missing history or chart is recorded in the result.
    pub async fn measure(market: &dyn MarketData, symbol: &str, chart_dir: Option<&Path>) -> Self {
        let history = match market.month_history(symbol).await {
            Ok(history) => history,
            Err(e) => {
                warn!(symbol, error = %e, "Price history unavailable");
                return Self {
                    symbol: symbol.to_string(),
                    unavailable: Some(e.to_string()),
                    ..Self::default()
                };
            }
        };

        let chart = chart_dir.and_then(|dir| {
            write_chart(dir, symbol, ChartKind::Trend, &history)
                .inspect_err(|e| warn!(symbol, error = %e, "Could not write trend chart"))
                .ok()
        });

        Self {
            symbol: symbol.to_string(),
            first_close: history.first().map(|q| q.close),
            last_close: history.last().map(|q| q.close),
            change_percent: price_change_percent(&history),
            points: history.len(),
            chart,
            unavailable: None,
        }
    }

    /// Heuristic recommendation for the measured change
    pub fn verdict(&self) -> Verdict {
        recommend(self.change_percent)
    }

    /// Plain text summary handed to the advisor
    pub fn briefing(&self) -> String {
        if let Some(reason) = &self.unavailable {
            return format!("Price history: data unavailable: {reason}");
        }

        let mut out = String::new();
        let _ = writeln!(out, "Symbol: {}", self.symbol);
        let _ = writeln!(out, "Trading days: {}", self.points);
        if let (Some(first), Some(last)) = (self.first_close, self.last_close) {
            let _ = writeln!(out, "First close: {first:.2}");
            let _ = writeln!(out, "Last close: {last:.2}");
        }
        let _ = writeln!(out, "Price change (1 month): {}", self.change_label());
        let verdict = self.verdict();
        let _ = write!(
            out,
            "Trend signal: {} ({})",
            verdict.recommendation, verdict.rationale
        );
        out
    }

    fn change_label(&self) -> String {
        match (self.change_percent, &self.unavailable) {
            (Some(change), _) => format!("{change:.2}%"),
            (None, Some(reason)) => format!("N/A (data unavailable: {reason})"),
            (None, None) => "N/A".to_string(),
        }
    }
}

/// The final report of a crew run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// The query as the user typed it, trimmed
    pub query: String,
    pub symbol: String,
    pub research: String,
    pub financial_analysis: String,
    pub filings_analysis: String,
    pub advice: String,
    pub performance: StockPerformance,
}

impl Report {
    /// Collect task outputs into report sections
    pub fn new(query: &str, output: &CrewOutput, performance: StockPerformance) -> Self {
        let section = |task: StockTask| output.get(task.name()).unwrap_or_default().trim().to_string();

        Self {
            query: query.to_string(),
            symbol: performance.symbol.clone(),
            research: section(StockTask::Research),
            financial_analysis: section(StockTask::FinancialAnalysis),
            filings_analysis: section(StockTask::FilingsAnalysis),
            advice: section(StockTask::Recommend),
            performance,
        }
    }

    /// Render the report as markdown
    pub fn to_markdown(&self) -> String {
        self.render(None)
    }

    /// Chart links are made relative to `report_dir` when given
    fn render(&self, report_dir: Option<&Path>) -> String {
        let verdict = self.performance.verdict();
        let mut out = String::new();

        let _ = writeln!(out, "# Investment Recommendation Report for {}\n", self.query);
        let _ = writeln!(out, "## Research Summary\n\n{}\n", self.research);
        let _ = writeln!(out, "## Financial Analysis\n\n{}\n", self.financial_analysis);
        let _ = writeln!(out, "## Filings Analysis\n\n{}\n", self.filings_analysis);

        out.push_str("## Stock Performance\n\n");
        let _ = writeln!(out, "- **Symbol**: {}", self.symbol);
        let _ = writeln!(
            out,
            "- **Price Change (1 Month)**: {}",
            self.performance.change_label()
        );
        if let Some(chart) = &self.performance.chart {
            let link = report_dir.map_or_else(|| chart.display().to_string(), |dir| relative_link(chart, dir));
            let _ = writeln!(out, "- **Trend Visualization**: ![Stock Trend]({link})");
        }

        out.push_str("\n## Recommendation\n\n");
        let _ = writeln!(out, "- **Recommendation**: {}", verdict.recommendation);
        let _ = writeln!(out, "- **Rationale**: {}", verdict.rationale);

        let _ = write!(out, "\n## Investment Advice\n\n{}\n", self.advice);
        out
    }

    /// Write the markdown to `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(Some(parent.unwrap_or(Path::new(".")))))?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }
}

/// `target` as a `/`-separated link from the directory `base`
///
/// Falls back to the absolute target when the two share no root.
fn relative_link(target: &Path, base: &Path) -> String {
    let (Ok(target), Ok(base)) = (std::path::absolute(target), std::path::absolute(base)) else {
        return target.display().to_string();
    };
    let target_parts: Vec<Component<'_>> = target.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return target.display().to_string();
    }

    let mut parts = vec!["..".to_string(); base_parts.len() - common];
    parts.extend(
        target_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompanyProfile, NewsItem, Quote};
    use crate::error::StockError;
    use crate::recommendation::Recommendation;
    use async_trait::async_trait;
    use chrono::Utc;
    use crew_workflow::TaskOutput;

    struct FixedHistory(Vec<f64>);

    #[async_trait]
    impl MarketData for FixedHistory {
        async fn resolve(&self, query: &str) -> Result<CompanyProfile> {
            Ok(CompanyProfile::bare(query))
        }

        async fn quote(&self, symbol: &str) -> Result<Quote> {
            Err(StockError::InvalidSymbol(symbol.to_string()))
        }

        async fn month_history(&self, symbol: &str) -> Result<Vec<Quote>> {
            if self.0.is_empty() {
                return Err(StockError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "no price history for the last month".to_string(),
                });
            }
            Ok(self
                .0
                .iter()
                .map(|&close| Quote {
                    symbol: symbol.to_string(),
                    timestamp: Utc::now(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 100,
                    adjclose: close,
                })
                .collect())
        }

        async fn news(&self, _symbol: &str) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }
    }

    fn crew_output() -> CrewOutput {
        let task = |name: &str, output: &str| TaskOutput {
            name: name.to_string(),
            agent: "agent".to_string(),
            output: format!("  {output}\n"),
        };
        CrewOutput {
            tasks: vec![
                task("research", "News looks good."),
                task("financial_analysis", "Margins expanded."),
                task("filings_analysis", "No red flags."),
                task("recommend", "Accumulate on dips."),
            ],
        }
    }

    #[tokio::test]
    async fn test_measure_with_chart() {
        let dir = tempfile::tempdir().unwrap();
        let market = FixedHistory(vec![100.0, 103.0, 110.0]);

        let perf = StockPerformance::measure(&market, "AAPL", Some(dir.path())).await;
        assert_eq!(perf.points, 3);
        assert!((perf.change_percent.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(perf.verdict().recommendation, Recommendation::Buy);
        let chart = perf.chart.unwrap();
        assert!(chart.ends_with("AAPL_trend.svg"));
        assert!(chart.exists());
    }

    #[tokio::test]
    async fn test_measure_without_history() {
        let market = FixedHistory(Vec::new());
        let perf = StockPerformance::measure(&market, "AAPL", None).await;

        assert!(perf.change_percent.is_none());
        assert!(perf.chart.is_none());
        assert!(perf.briefing().starts_with("Price history: data unavailable:"));
        assert_eq!(perf.verdict().recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_markdown_layout() {
        let perf = StockPerformance {
            symbol: "AAPL".to_string(),
            first_close: Some(100.0),
            last_close: Some(94.0),
            change_percent: Some(-6.0),
            points: 21,
            chart: Some(PathBuf::from("charts/AAPL_trend.svg")),
            unavailable: None,
        };
        let report = Report::new("Apple", &crew_output(), perf);
        let md = report.to_markdown();

        let headings: Vec<&str> = md.lines().filter(|l| l.starts_with('#')).collect();
        assert_eq!(
            headings,
            vec![
                "# Investment Recommendation Report for Apple",
                "## Research Summary",
                "## Financial Analysis",
                "## Filings Analysis",
                "## Stock Performance",
                "## Recommendation",
                "## Investment Advice",
            ]
        );
        assert!(md.contains("## Research Summary\n\nNews looks good.\n"));
        assert!(md.contains("- **Price Change (1 Month)**: -6.00%"));
        assert!(md.contains("![Stock Trend](charts/AAPL_trend.svg)"));
        assert!(md.contains("- **Recommendation**: Sell"));
        assert!(md.contains("significant decline"));
        assert!(md.ends_with("Accumulate on dips.\n"));
    }

    #[test]
    fn test_markdown_without_history() {
        let perf = StockPerformance {
            symbol: "XYZ".to_string(),
            unavailable: Some("no price history".to_string()),
            ..StockPerformance::default()
        };
        let md = Report::new("XYZ", &crew_output(), perf).to_markdown();
        assert!(md.contains("N/A (data unavailable: no price history)"));
        assert!(md.contains("Insufficient data to make a strong recommendation."));
        assert!(!md.contains("Trend Visualization"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested/report.md");
        let report = Report::new("Apple", &crew_output(), StockPerformance::default());

        report.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.to_string());
    }

    #[test]
    fn test_written_chart_link_is_relative_to_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let perf = StockPerformance {
            symbol: "AAPL".to_string(),
            chart: Some(dir.path().join("AAPL_trend.svg")),
            ..StockPerformance::default()
        };
        let report = Report::new("Apple", &crew_output(), perf);

        let nested = dir.path().join("reports/x.md");
        report.write_to(&nested).unwrap();
        let written = std::fs::read_to_string(&nested).unwrap();
        assert!(written.contains("![Stock Trend](../AAPL_trend.svg)"));

        let beside = dir.path().join("report.md");
        report.write_to(&beside).unwrap();
        let written = std::fs::read_to_string(&beside).unwrap();
        assert!(written.contains("![Stock Trend](AAPL_trend.svg)"));
    }

    #[test]
    fn test_relative_link() {
        assert_eq!(
            relative_link(Path::new("./AAPL_trend.svg"), Path::new("reports")),
            "../AAPL_trend.svg"
        );
        assert_eq!(
            relative_link(Path::new("/data/charts/AAPL_trend.svg"), Path::new("/data/out")),
            "../charts/AAPL_trend.svg"
        );
        assert_eq!(
            relative_link(Path::new("/data/AAPL_trend.svg"), Path::new("/data")),
            "AAPL_trend.svg"
        );
    }
}
