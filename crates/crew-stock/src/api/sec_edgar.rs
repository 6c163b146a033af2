//! SEC EDGAR API client for fetching company filings and financial reports
//!
//! SEC EDGAR is the Electronic Data Gathering, Analysis, and Retrieval system
//! used by the U.S. Securities and Exchange Commission.
//!
//! Rate limit: 10 requests per second (as per SEC fair access policy)
//! User-Agent requirement: Must include company name and contact email

use crate::api::{http_client, send};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const SEC_BASE_URL: &str = "https://data.sec.gov";
const SEC_COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SEC_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
const PROVIDER: &str = "SEC EDGAR";

const SEC_REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// SEC filing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingType {
    /// Annual report
    #[serde(rename = "10-K")]
    Form10K,
    /// Quarterly report
    #[serde(rename = "10-Q")]
    Form10Q,
    /// Current report (material events)
    #[serde(rename = "8-K")]
    Form8K,
    /// Proxy statement
    #[serde(rename = "DEF 14A")]
    DefProxy,
    /// Registration statement
    #[serde(rename = "S-1")]
    FormS1,
}

impl FilingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingType::Form10K => "10-K",
            FilingType::Form10Q => "10-Q",
            FilingType::Form8K => "8-K",
            FilingType::DefProxy => "DEF 14A",
            FilingType::FormS1 => "S-1",
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilingType {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace(' ', "").as_str() {
            "10-K" | "10K" => Ok(Self::Form10K),
            "10-Q" | "10Q" => Ok(Self::Form10Q),
            "8-K" | "8K" => Ok(Self::Form8K),
            "DEF14A" => Ok(Self::DefProxy),
            "S-1" | "S1" => Ok(Self::FormS1),
            other => Err(StockError::InvalidInput(format!("unknown form type '{other}'"))),
        }
    }
}

/// SEC filing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecFiling {
    /// Ticker the filing was looked up for
    pub ticker: String,
    /// Accession number (unique filing identifier)
    pub accession_number: String,
    /// Filing type (10-K, 10-Q, 8-K, etc.)
    pub form_type: String,
    /// Filing date
    pub filing_date: String,
    /// Report date (period covered)
    pub report_date: Option<String>,
    /// Primary document description
    pub description: Option<String>,
    /// Link to the filing document
    pub url: String,
}

impl fmt::Display for SecFiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} filed {}", self.ticker, self.form_type, self.filing_date)?;
        if let Some(period) = self.report_date.as_deref().filter(|p| !p.is_empty()) {
            write!(f, " (period ending {period})")?;
        }
        write!(f, ": {}", self.url)
    }
}

/// Headline figures for the latest reported period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFigures {
    /// Registrant name
    pub entity_name: String,
    /// Period end date of the figures
    pub period_end: Option<String>,
    /// Fiscal year and period label, e.g. `FY2024 Q3`
    pub fiscal_period: Option<String>,
    /// Revenue
    pub revenue: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Earnings per share (basic)
    pub eps_basic: Option<f64>,
    /// Earnings per share (diluted)
    pub eps_diluted: Option<f64>,
}

impl KeyFigures {
    /// Human-readable summary with `N/A` for missing figures
    pub fn summary(&self) -> String {
        let money = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), human_amount);
        let eps = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"));
        format!(
            "Registrant: {}\nPeriod: {} (ending {})\nRevenue: {}\nNet Income: {}\nEPS (basic): {}\nEPS (diluted): {}",
            self.entity_name,
            self.fiscal_period.as_deref().unwrap_or("N/A"),
            self.period_end.as_deref().unwrap_or("N/A"),
            money(self.revenue),
            money(self.net_income),
            eps(self.eps_basic),
            eps(self.eps_diluted),
        )
    }
}

/// Format a dollar amount with a B/M/K suffix
pub fn human_amount(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{sign}${:.2}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}${:.2}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{sign}${:.2}K", abs / 1e3)
    } else {
        format!("{sign}${abs:.2}")
    }
}

/// Company facts response from SEC
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompanyFacts {
    #[serde(rename = "entityName")]
    entity_name: String,
    facts: Facts,
}

#[derive(Debug, Clone, Deserialize)]
struct Facts {
    #[serde(rename = "us-gaap")]
    us_gaap: Option<serde_json::Value>,
}

/// SEC submissions response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompanySubmissions {
    filings: FilingsData,
}

#[derive(Debug, Clone, Deserialize)]
struct FilingsData {
    recent: RecentFilings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    accession_number: Vec<String>,
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<Option<String>>,
    form: Vec<String>,
    primary_document: Vec<String>,
    #[serde(default)]
    primary_doc_description: Vec<Option<String>>,
}

/// One reported value of an XBRL concept
#[derive(Debug, Clone)]
struct FactEntry {
    val: f64,
    start: Option<String>,
    end: String,
    filed: String,
    fy: Option<i64>,
    fp: Option<String>,
}

/// SEC EDGAR API client
#[derive(Clone)]
pub struct SecEdgarClient {
    client: Client,
    rate_limiter: SharedRateLimiter,
    retry: RetryPolicy,
    cik_cache: Arc<RwLock<HashMap<String, String>>>,
}

impl SecEdgarClient {
    /// Create a new SEC EDGAR client
    ///
    /// The configured User-Agent must name the requester and a contact
    /// address, e.g. `"MyApp admin@example.com"`.
    pub fn new(config: &StockConfig) -> Result<Self> {
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            SEC_REQUESTS_PER_SECOND,
        )));

        Ok(Self {
            client: http_client(config.request_timeout, &config.sec_user_agent)?,
            rate_limiter,
            retry: config.retry_policy(),
            cik_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// GET a URL under the rate limit and retry policy
    async fn get_text(&self, operation: &str, url: &str) -> Result<String> {
        let (client, limiter) = (&self.client, &self.rate_limiter);
        self.retry
            .execute(operation, || async move {
                limiter.until_ready().await;
                let response = send(PROVIDER, client.get(url)).await?;
                Ok::<_, StockError>(response.text().await?)
            })
            .await
    }

    /// Get CIK number from stock ticker
    #[instrument(skip(self))]
    pub async fn get_cik(&self, ticker: &str) -> Result<String> {
        let ticker_upper = ticker.trim().to_uppercase();
        let cached = self
            .cik_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ticker_upper)
            .cloned();
        if let Some(cik) = cached {
            return Ok(cik);
        }

        let body = self.get_text("sec.company_tickers", SEC_COMPANY_TICKERS_URL).await?;
        let data: serde_json::Value = serde_json::from_str(&body)?;
        let cik = find_cik(&data, &ticker_upper)
            .ok_or_else(|| StockError::InvalidSymbol(ticker.to_string()))?;

        self.cik_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ticker_upper, cik.clone());
        Ok(cik)
    }

    /// Get company submissions (filing history)
    pub(crate) async fn get_company_submissions(&self, cik: &str) -> Result<CompanySubmissions> {
        let url = format!("{SEC_BASE_URL}/submissions/CIK{}.json", pad_cik(cik));
        let body = self.get_text("sec.submissions", &url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Most recent filing of a form type
    #[instrument(skip(self))]
    pub async fn latest_filing(&self, ticker: &str, form: FilingType) -> Result<SecFiling> {
        let cik = self.get_cik(ticker).await?;
        let submissions = self.get_company_submissions(&cik).await?;
        latest_from_submissions(&submissions, ticker, &cik, form).ok_or_else(|| {
            StockError::DataUnavailable {
                symbol: ticker.to_uppercase(),
                reason: format!("no {form} filings found"),
            }
        })
    }

    /// Get company facts (XBRL financial data)
    pub(crate) async fn get_company_facts(&self, cik: &str) -> Result<CompanyFacts> {
        let url = format!("{SEC_BASE_URL}/api/xbrl/companyfacts/CIK{}.json", pad_cik(cik));
        let body = self.get_text("sec.company_facts", &url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Headline figures for a ticker's latest reported period
    #[instrument(skip(self))]
    pub async fn key_figures(&self, ticker: &str) -> Result<KeyFigures> {
        let cik = self.get_cik(ticker).await?;
        let facts = self.get_company_facts(&cik).await?;
        extract_key_figures(&facts).ok_or_else(|| StockError::DataUnavailable {
            symbol: ticker.to_uppercase(),
            reason: "no US-GAAP figures reported".to_string(),
        })
    }

    /// Download a filing document as raw HTML
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, url: &str) -> Result<String> {
        self.get_text("sec.document", url).await
    }
}

/// Pad CIK to 10 digits
fn pad_cik(cik: &str) -> String {
    format!("{:0>10}", cik.trim_start_matches('0'))
}

/// Build URL to access a filing document
pub fn filing_url(cik: &str, accession_number: &str, document: &str) -> String {
    format!(
        "{SEC_ARCHIVES_URL}/{}/{}/{document}",
        cik.trim_start_matches('0'),
        accession_number.replace('-', "")
    )
}

/// Search the `company_tickers.json` table for a ticker
///
/// `cik_str` is a number in the published file; strings are accepted too.
pub(crate) fn find_cik(data: &serde_json::Value, ticker_upper: &str) -> Option<String> {
    data.as_object()?.values().find_map(|company| {
        let matches = company
            .get("ticker")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t.eq_ignore_ascii_case(ticker_upper));
        if !matches {
            return None;
        }
        match company.get("cik_str")? {
            serde_json::Value::Number(n) => n.as_u64().map(|n| n.to_string()),
            serde_json::Value::String(s) => Some(s.clone()),
            _ => None,
        }
    })
}

pub(crate) fn latest_from_submissions(
    submissions: &CompanySubmissions,
    ticker: &str,
    cik: &str,
    form: FilingType,
) -> Option<SecFiling> {
    let recent = &submissions.filings.recent;
    // Recent filings are listed newest first.
    let i = recent.form.iter().position(|f| f == form.as_str())?;

    Some(SecFiling {
        ticker: ticker.to_uppercase(),
        accession_number: recent.accession_number.get(i)?.clone(),
        form_type: recent.form[i].clone(),
        filing_date: recent.filing_date.get(i)?.clone(),
        report_date: recent.report_date.get(i).cloned().flatten(),
        description: recent.primary_doc_description.get(i).cloned().flatten(),
        url: filing_url(
            cik,
            recent.accession_number.get(i)?,
            recent.primary_document.get(i)?,
        ),
    })
}

fn fact_entries(us_gaap: &serde_json::Value, concept: &str) -> Vec<FactEntry> {
    let Some(units) = us_gaap.get(concept).and_then(|c| c.get("units")) else {
        return Vec::new();
    };
    let Some(entries) = units
        .get("USD")
        .or_else(|| units.get("USD/shares"))
        .and_then(|u| u.as_array())
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            Some(FactEntry {
                val: entry.get("val")?.as_f64()?,
                start: entry.get("start").and_then(|s| s.as_str()).map(str::to_string),
                end: entry.get("end")?.as_str()?.to_string(),
                filed: entry.get("filed")?.as_str()?.to_string(),
                fy: entry.get("fy").and_then(serde_json::Value::as_i64),
                fp: entry.get("fp").and_then(|f| f.as_str()).map(str::to_string),
            })
        })
        .collect()
}

/// Latest period first, then the shortest duration, then the latest filing
fn newest(entries: &[FactEntry]) -> Option<&FactEntry> {
    entries
        .iter()
        .max_by(|a, b| (&a.end, &a.start, &a.filed).cmp(&(&b.end, &b.start, &b.filed)))
}

/// The value reported for the period ending on `end`
fn at_period<'a>(entries: &'a [FactEntry], end: &str) -> Option<&'a FactEntry> {
    entries
        .iter()
        .filter(|e| e.end == end)
        .max_by(|a, b| (&a.start, &a.filed).cmp(&(&b.start, &b.filed)))
}

/// Extract the key figures from company facts
pub(crate) fn extract_key_figures(facts: &CompanyFacts) -> Option<KeyFigures> {
    let us_gaap = facts.facts.us_gaap.as_ref()?;

    let revenue = [
        "Revenues",
        "RevenueFromContractWithCustomerExcludingAssessedTax",
        "SalesRevenueNet",
    ]
    .iter()
    .map(|concept| fact_entries(us_gaap, concept))
    .filter(|entries| !entries.is_empty())
    .max_by(|a, b| newest(a).map(|e| &e.end).cmp(&newest(b).map(|e| &e.end)))
    .unwrap_or_default();
    let net_income = fact_entries(us_gaap, "NetIncomeLoss");
    let eps_basic = fact_entries(us_gaap, "EarningsPerShareBasic");
    let eps_diluted = fact_entries(us_gaap, "EarningsPerShareDiluted");

    let anchor = newest(&revenue).or_else(|| newest(&net_income))?.clone();
    debug!(end = %anchor.end, "Key figures period");

    let value_at = |entries: &[FactEntry]| at_period(entries, &anchor.end).map(|e| e.val);
    let fiscal_period = match (anchor.fy, anchor.fp.as_deref()) {
        (Some(fy), Some(fp)) => Some(format!("FY{fy} {fp}")),
        (Some(fy), None) => Some(format!("FY{fy}")),
        _ => None,
    };

    Some(KeyFigures {
        entity_name: facts.entity_name.clone(),
        period_end: Some(anchor.end.clone()),
        fiscal_period,
        revenue: value_at(&revenue),
        net_income: value_at(&net_income),
        eps_basic: value_at(&eps_basic),
        eps_diluted: value_at(&eps_diluted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filing_type() {
        assert_eq!(FilingType::Form10K.as_str(), "10-K");
        assert_eq!(FilingType::Form10Q.as_str(), "10-Q");
        assert_eq!("10q".parse::<FilingType>().unwrap(), FilingType::Form10Q);
        assert_eq!("DEF 14A".parse::<FilingType>().unwrap(), FilingType::DefProxy);
        assert!("20-F".parse::<FilingType>().is_err());
    }

    #[test]
    fn test_find_cik_numeric_and_string() {
        let data = json!({
            "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
            "1": {"cik_str": "789019", "ticker": "MSFT", "title": "MICROSOFT CORP"}
        });
        assert_eq!(find_cik(&data, "AAPL").as_deref(), Some("320193"));
        assert_eq!(find_cik(&data, "MSFT").as_deref(), Some("789019"));
        assert_eq!(find_cik(&data, "GOOG"), None);
    }

    #[test]
    fn test_pad_cik_and_url() {
        assert_eq!(pad_cik("320193"), "0000320193");
        assert_eq!(
            filing_url("0000320193", "0000320193-24-000081", "aapl-20240629.htm"),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019324000081/aapl-20240629.htm"
        );
    }

    #[test]
    fn test_latest_filing_of_form() {
        let submissions: CompanySubmissions = serde_json::from_value(json!({
            "cik": "320193",
            "name": "Apple Inc.",
            "filings": {"recent": {
                "accessionNumber": ["0000320193-24-000090", "0000320193-24-000081", "0000320193-23-000106"],
                "filingDate": ["2024-09-01", "2024-08-02", "2023-11-03"],
                "reportDate": ["", "2024-06-29", "2023-09-30"],
                "form": ["8-K", "10-Q", "10-K"],
                "primaryDocument": ["a8k.htm", "aapl-20240629.htm", "aapl-20230930.htm"],
                "primaryDocDescription": [null, "10-Q", "10-K"]
            }}
        }))
        .unwrap();

        let filing = latest_from_submissions(&submissions, "aapl", "320193", FilingType::Form10Q).unwrap();
        assert_eq!(filing.ticker, "AAPL");
        assert_eq!(filing.filing_date, "2024-08-02");
        assert_eq!(filing.report_date.as_deref(), Some("2024-06-29"));
        assert!(filing.url.ends_with("/320193/000032019324000081/aapl-20240629.htm"));
        assert!(filing.to_string().contains("(period ending 2024-06-29)"));

        assert!(latest_from_submissions(&submissions, "AAPL", "320193", FilingType::FormS1).is_none());
    }

    #[test]
    fn test_extract_key_figures_prefers_latest_quarter() {
        let facts: CompanyFacts = serde_json::from_value(json!({
            "cik": 320193,
            "entityName": "Apple Inc.",
            "facts": {"us-gaap": {
                "RevenueFromContractWithCustomerExcludingAssessedTax": {"units": {"USD": [
                    {"start": "2023-10-01", "end": "2024-06-29", "val": 294866000000.0, "fy": 2024, "fp": "Q3", "form": "10-Q", "filed": "2024-08-02"},
                    {"start": "2024-03-31", "end": "2024-06-29", "val": 85777000000.0, "fy": 2024, "fp": "Q3", "form": "10-Q", "filed": "2024-08-02"},
                    {"start": "2022-09-25", "end": "2023-09-30", "val": 383285000000.0, "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2023-11-03"}
                ]}},
                "NetIncomeLoss": {"units": {"USD": [
                    {"start": "2024-03-31", "end": "2024-06-29", "val": 21448000000.0, "fy": 2024, "fp": "Q3", "form": "10-Q", "filed": "2024-08-02"}
                ]}},
                "EarningsPerShareDiluted": {"units": {"USD/shares": [
                    {"start": "2024-03-31", "end": "2024-06-29", "val": 1.4, "fy": 2024, "fp": "Q3", "form": "10-Q", "filed": "2024-08-02"}
                ]}}
            }}
        }))
        .unwrap();

        let figures = extract_key_figures(&facts).unwrap();
        assert_eq!(figures.entity_name, "Apple Inc.");
        assert_eq!(figures.period_end.as_deref(), Some("2024-06-29"));
        assert_eq!(figures.fiscal_period.as_deref(), Some("FY2024 Q3"));
        assert_eq!(figures.revenue, Some(85_777_000_000.0));
        assert_eq!(figures.net_income, Some(21_448_000_000.0));
        assert_eq!(figures.eps_diluted, Some(1.4));
        assert_eq!(figures.eps_basic, None);

        let summary = figures.summary();
        assert!(summary.contains("Revenue: $85.78B"));
        assert!(summary.contains("EPS (basic): N/A"));
    }

    #[test]
    fn test_human_amount() {
        assert_eq!(human_amount(1_500_000_000.0), "$1.50B");
        assert_eq!(human_amount(-2_000_000.0), "-$2.00M");
        assert_eq!(human_amount(950.0), "$950.00");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_cik() {
        let client = SecEdgarClient::new(&StockConfig::default()).unwrap();
        assert_eq!(client.get_cik("AAPL").await.unwrap(), "320193");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_latest_10k() {
        let client = SecEdgarClient::new(&StockConfig::default()).unwrap();
        let filing = client.latest_filing("AAPL", FilingType::Form10K).await.unwrap();
        assert_eq!(filing.form_type, "10-K");
    }
}
