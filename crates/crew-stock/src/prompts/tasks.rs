//! Task descriptions and expected outputs

use super::render;
use crate::error::Result;
use serde_json::json;
use std::fmt;

const TIP_TEMPLATE: &str =
    "You must *always* return the stock ticker! Use only recent information (Today's Date is {{ today }})";

const RESEARCH: &str = r"
Collect and summarize recent news articles, press releases, and market analyses related to the stock and its industry.
Pay special attention to any significant events, market sentiments, and analysts' opinions. Also include upcoming events like earnings and others.

{{ tip }}

Make sure to use the most recent data as possible.

Selected company by the customer: {{ company }}";

const RESEARCH_OUTPUT: &str = "Your final answer MUST be a report that includes a comprehensive \
summary of the latest news, any notable shifts in market sentiment, and potential impacts on the \
stock. Also make sure to return the stock ticker.";

const FINANCIAL_ANALYSIS: &str = r"
Conduct a thorough analysis of the stock's financial health and market performance.
This includes examining key financial metrics such as P/E ratio, EPS growth, revenue trends, and debt-to-equity ratio.
Also, analyze the stock's performance in comparison to its industry peers and overall market trends.

Your final report MUST expand on the summary provided but now including a clear assessment of the stock's financial standing, its strengths and weaknesses, and how it fares against its competitors in the current market scenario.
{{ tip }}

Make sure to use the most recent data possible.
Selected company by the customer: {{ company }}";

const FINANCIAL_ANALYSIS_OUTPUT: &str = "Your final report MUST expand on the summary provided but \
now including a clear assessment of the stock's financial standing, its strengths and weaknesses, \
and how it fares against its competitors in the current market scenario. Always return the stock \
ticker.";

const FILINGS_ANALYSIS: &str = r"
Analyze the latest quarterly and annual income statements for the stock in question.
Analyze the stock's fundamentals and focus on key metrics/ratios.
Focus on key sections like Management's Discussion and Analysis, financial statements, insider trading activity, and any disclosed risks.
Extract relevant data and insights that could influence the stock's future performance.

Your final answer must be an expanded report that now also highlights significant findings from these filings, including any red flags or positive indicators for your customer.
{{ tip }}

Selected company by the customer: {{ company }}";

const FILINGS_ANALYSIS_OUTPUT: &str = "Your final answer must be an expanded report that now also \
highlights significant findings from these filings, including any red flags or positive \
indicators for your customer. Always return the stock ticker.";

const RECOMMEND: &str = r"
Review and synthesize the analyses provided by the Financial Analyst and the Research Analyst.
Combine these insights to form a comprehensive investment recommendation.

You MUST Consider all aspects, including financial health, market sentiment, and qualitative data from annual/quarterly income statements.

Make sure to include a section that shows insider trading activity, and upcoming events like earnings.

Your final answer MUST be a recommendation for your customer. It should be a full super detailed report, providing a clear investment stance and strategy with supporting evidence.
Make it pretty and well formatted for your customer.
{{ tip }}

Selected company by the customer: {{ company }}";

const RECOMMEND_OUTPUT: &str = "Your final answer MUST be a recommendation for your customer. It \
should be a full super detailed report, providing a clear investment stance and strategy with \
supporting evidence. Make it pretty and well formatted for your customer. Always return the \
stock ticker.";

/// The date tip appended to every task description
pub fn tip_section(today: &str) -> Result<String> {
    render("tip", TIP_TEMPLATE, &json!({ "today": today }))
}

/// The four stages of a stock analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockTask {
    Research,
    FinancialAnalysis,
    FilingsAnalysis,
    Recommend,
}

/// Rendered text of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPrompt {
    pub description: String,
    pub expected_output: String,
}

impl StockTask {
    /// Every task, in pipeline order
    pub const ALL: [StockTask; 4] = [
        StockTask::Research,
        StockTask::FinancialAnalysis,
        StockTask::FilingsAnalysis,
        StockTask::Recommend,
    ];

    /// Task name used in the crew and in task outputs
    pub fn name(&self) -> &'static str {
        match self {
            StockTask::Research => "research",
            StockTask::FinancialAnalysis => "financial_analysis",
            StockTask::FilingsAnalysis => "filings_analysis",
            StockTask::Recommend => "recommend",
        }
    }

    /// Tasks whose outputs feed this one
    pub fn dependencies(&self) -> &'static [StockTask] {
        match self {
            StockTask::Research => &[],
            StockTask::FinancialAnalysis => &[StockTask::Research],
            StockTask::FilingsAnalysis => &[StockTask::FinancialAnalysis],
            StockTask::Recommend => &[
                StockTask::Research,
                StockTask::FinancialAnalysis,
                StockTask::FilingsAnalysis,
            ],
        }
    }

    fn templates(&self) -> (&'static str, &'static str) {
        match self {
            StockTask::Research => (RESEARCH, RESEARCH_OUTPUT),
            StockTask::FinancialAnalysis => (FINANCIAL_ANALYSIS, FINANCIAL_ANALYSIS_OUTPUT),
            StockTask::FilingsAnalysis => (FILINGS_ANALYSIS, FILINGS_ANALYSIS_OUTPUT),
            StockTask::Recommend => (RECOMMEND, RECOMMEND_OUTPUT),
        }
    }

    /// Render the description for `company` as of `today` (YYYY-MM-DD)
    pub fn prompt(&self, company: &str, today: &str) -> Result<TaskPrompt> {
        let (description, expected_output) = self.templates();
        let tip = tip_section(today)?;

        Ok(TaskPrompt {
            description: render(
                self.name(),
                description,
                &json!({ "company": company, "tip": tip }),
            )?,
            expected_output: expected_output.to_string(),
        })
    }
}

impl fmt::Display for StockTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
