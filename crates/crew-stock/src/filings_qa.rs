//! Question answering over the latest filing of a company
//!
//! The filing text is split into overlapping chunks and the chunks sharing the
//! most terms with the question are returned as the answer context.

use crate::api::{FilingSource, FilingType, SecFiling};
use crate::api::scrape::chunk_text;
use crate::error::{Result, StockError};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Characters per chunk
pub const CHUNK_CHARS: usize = 1000;
/// Characters shared by consecutive chunks
pub const CHUNK_OVERLAP: usize = 150;
/// Chunks returned per question
pub const TOP_CHUNKS: usize = 4;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "what", "which", "who", "how", "with", "that",
    "this", "from", "has", "have", "had", "its", "their", "did", "does", "about", "any", "into",
    "our", "than", "then", "there", "these", "those", "when", "where", "why", "will", "would",
];

/// A `TICKER|question` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingQuestion {
    pub ticker: String,
    pub question: String,
}

impl FromStr for FilingQuestion {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        let (ticker, question) = s.split_once('|').ok_or_else(|| {
            StockError::InvalidInput(format!("expected 'TICKER|question', got '{s}'"))
        })?;
        let (ticker, question) = (ticker.trim(), question.trim());
        if ticker.is_empty() || question.is_empty() {
            return Err(StockError::InvalidInput(
                "both ticker and question are required".to_string(),
            ));
        }
        Ok(Self {
            ticker: ticker.to_uppercase(),
            question: question.to_string(),
        })
    }
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

/// Rank chunks by how many distinct question terms they contain, then by
/// total term hits; document order breaks ties
///
/// When no chunk mentions any question term the first `top_k` chunks are
/// returned.
pub fn rank_chunks<'a>(chunks: &'a [String], question: &str, top_k: usize) -> Vec<&'a str> {
    let wanted: HashSet<String> = terms(question).collect();

    let mut scored: Vec<(usize, usize, usize)> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut distinct = HashSet::new();
            let mut hits = 0;
            for term in terms(chunk).filter(|t| wanted.contains(t)) {
                hits += 1;
                distinct.insert(term);
            }
            (distinct.len(), hits, i)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));
    scored
        .into_iter()
        .take(top_k)
        .map(|(_, _, i)| chunks[i].as_str())
        .collect()
}

/// Answer context for a question about the latest filing of `form`
#[instrument(skip(filings))]
pub async fn answer(
    filings: &dyn FilingSource,
    request: &FilingQuestion,
    form: FilingType,
) -> Result<String> {
    let filing = filings.latest_filing(&request.ticker, form).await?;
    answer_from(filings, &filing, &request.question).await
}

/// Answer context from a filing the caller already looked up
pub async fn answer_from(
    filings: &dyn FilingSource,
    filing: &SecFiling,
    question: &str,
) -> Result<String> {
    debug!(filing = %filing, "Answering from filing");

    let text = filings.document_text(filing).await?;
    let chunks = chunk_text(&text, CHUNK_CHARS, CHUNK_OVERLAP);
    if chunks.is_empty() {
        return Err(StockError::DataUnavailable {
            symbol: filing.ticker.clone(),
            reason: format!("the latest {} filing has no readable text", filing.form_type),
        });
    }

    Ok(rank_chunks(&chunks, question, TOP_CHUNKS).join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::KeyFigures;
    use async_trait::async_trait;

    #[test]
    fn test_parse_question() {
        let q: FilingQuestion = "aapl| What was revenue? ".parse().unwrap();
        assert_eq!(q.ticker, "AAPL");
        assert_eq!(q.question, "What was revenue?");

        assert!("AAPL".parse::<FilingQuestion>().is_err());
        assert!("|question".parse::<FilingQuestion>().is_err());
        assert!("AAPL|  ".parse::<FilingQuestion>().is_err());
    }

    #[test]
    fn test_rank_chunks() {
        let chunks = vec![
            "Cover page and table of contents".to_string(),
            "Net sales by category: iPhone, Mac, Services revenue grew".to_string(),
            "Risk factors: supply chain and revenue concentration".to_string(),
            "Total net sales and revenue for the quarter, services revenue".to_string(),
        ];

        let ranked = rank_chunks(&chunks, "What were the net sales and services revenue?", 2);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].starts_with("Total net sales"));
        assert!(ranked[1].starts_with("Net sales by category"));
    }

    #[test]
    fn test_rank_chunks_without_matches_keeps_document_order() {
        let chunks = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        assert_eq!(rank_chunks(&chunks, "dividends?", 2), vec!["alpha", "beta"]);
    }

    struct FakeFilings {
        text: String,
    }

    #[async_trait]
    impl FilingSource for FakeFilings {
        async fn latest_filing(&self, ticker: &str, form: FilingType) -> Result<SecFiling> {
            Ok(SecFiling {
                ticker: ticker.to_string(),
                accession_number: "0000000000-24-000001".to_string(),
                form_type: form.as_str().to_string(),
                filing_date: "2024-08-02".to_string(),
                report_date: None,
                description: None,
                url: "https://www.sec.gov/doc.htm".to_string(),
            })
        }

        async fn key_figures(&self, ticker: &str) -> Result<KeyFigures> {
            Err(StockError::DataUnavailable {
                symbol: ticker.to_string(),
                reason: "not needed".to_string(),
            })
        }

        async fn document_text(&self, _filing: &SecFiling) -> Result<String> {
            Ok(self.text.clone())
        }
    }

    #[tokio::test]
    async fn test_answer_returns_relevant_chunks() {
        let mut text = "Boilerplate. ".repeat(200);
        text.push_str("Dividend declared of $0.25 per share payable in November. ");
        text.push_str(&"More boilerplate. ".repeat(200));
        let filings = FakeFilings { text };

        let request: FilingQuestion = "AAPL|What dividend was declared per share?".parse().unwrap();
        let answer = answer(&filings, &request, FilingType::Form10Q).await.unwrap();

        let first = answer.split("\n\n").next().unwrap();
        assert!(first.contains("Dividend declared"));
        assert!(answer.split("\n\n").count() <= TOP_CHUNKS);
    }

    #[tokio::test]
    async fn test_answer_on_empty_document() {
        let filings = FakeFilings { text: String::new() };
        let request: FilingQuestion = "AAPL|revenue".parse().unwrap();
        let err = answer(&filings, &request, FilingType::Form10K).await.unwrap_err();
        assert!(matches!(err, StockError::DataUnavailable { .. }));
    }
}
