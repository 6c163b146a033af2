//! sec-api.io query client
//!
//! Used instead of raw EDGAR lookups when `SEC_API_API_KEY` is configured.

use crate::api::{http_client, send};
use crate::api::sec_edgar::{FilingType, SecFiling};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

const SEC_API_URL: &str = "https://api.sec-api.io";
const PROVIDER: &str = "sec-api.io";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    filings: Vec<QueryFiling>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryFiling {
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    accession_no: Option<String>,
    form_type: String,
    filed_at: String,
    #[serde(default)]
    period_of_report: Option<String>,
    #[serde(default)]
    description: Option<String>,
    link_to_filing_details: String,
}

/// sec-api.io client
#[derive(Clone)]
pub struct SecApiClient {
    client: Client,
    api_key: String,
    retry: RetryPolicy,
}

impl SecApiClient {
    /// Create a client with an API key
    pub fn new(api_key: String, config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout, "stock-crew/0.1")?,
            api_key,
            retry: config.retry_policy(),
        })
    }

    /// Most recent filing of a form type
    #[instrument(skip(self))]
    pub async fn latest_filing(&self, ticker: &str, form: FilingType) -> Result<SecFiling> {
        let body = filing_query(ticker, form);
        let (client, api_key, body) = (&self.client, self.api_key.as_str(), &body);

        let text = self
            .retry
            .execute("sec_api.query", || async move {
                let request = client
                    .post(SEC_API_URL)
                    .header("Authorization", api_key)
                    .json(body);
                Ok::<_, StockError>(send(PROVIDER, request).await?.text().await?)
            })
            .await?;

        parse_latest(&text, ticker)?.ok_or_else(|| StockError::DataUnavailable {
            symbol: ticker.to_uppercase(),
            reason: format!("no {form} filings found"),
        })
    }
}

/// Query for the newest filing of one form type
pub(crate) fn filing_query(ticker: &str, form: FilingType) -> Value {
    json!({
        "query": {
            "query_string": {
                "query": format!("ticker:{} AND formType:\"{}\"", ticker.to_uppercase(), form.as_str())
            }
        },
        "from": "0",
        "size": "1",
        "sort": [{ "filedAt": { "order": "desc" } }]
    })
}

pub(crate) fn parse_latest(body: &str, ticker: &str) -> Result<Option<SecFiling>> {
    let response: QueryResponse = serde_json::from_str(body)?;
    Ok(response.filings.into_iter().next().map(|f| SecFiling {
        ticker: f.ticker.unwrap_or_else(|| ticker.to_uppercase()),
        accession_number: f.accession_no.unwrap_or_default(),
        form_type: f.form_type,
        filing_date: f.filed_at.chars().take(10).collect(),
        report_date: f.period_of_report,
        description: f.description,
        url: f.link_to_filing_details,
    }))
}
