//! Web page scraping and HTML-to-text reduction

use crate::api::{PageFetcher, http_client, send};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use crew_llm::{CompletionRequest, LLMProvider, Message};
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; stock-crew/0.1)";
const PROVIDER: &str = "web";

/// Chunk size used when summarizing scraped pages
pub const SUMMARY_CHUNK_CHARS: usize = 8000;

const SUMMARY_SYSTEM_PROMPT: &str = "You're a Principal Researcher at a big company and you need \
to do research about a given topic. Do amazing research and summaries based on the content you \
are working with.";

/// Compiled patterns for reducing HTML to readable text
#[derive(Debug)]
pub struct HtmlCleaner {
    hidden: Regex,
    comments: Regex,
    breaks: Regex,
    tags: Regex,
    numeric_entity: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

impl HtmlCleaner {
    /// Compile the patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| StockError::Other(format!("invalid pattern: {e}")))
        };

        Ok(Self {
            hidden: compile(r"(?is)<(script|style|noscript|svg|head)\b[^>]*>.*?</(script|style|noscript|svg|head)\s*>")?,
            comments: compile(r"(?s)<!--.*?-->")?,
            breaks: compile(r"(?i)<(br|/p|/div|/li|/tr|/h[1-6]|/section|/article|/table)\b[^>]*>")?,
            tags: compile(r"(?s)<[^>]*>")?,
            numeric_entity: compile(r"&#(x[0-9a-fA-F]+|[0-9]+);")?,
            spaces: compile(r"[ \t\u{a0}]+")?,
            blank_lines: compile(r"\n{3,}")?,
        })
    }

    /// Drop scripts and styles, strip tags, decode entities, collapse whitespace
    pub fn html_to_text(&self, html: &str) -> String {
        let text = self.hidden.replace_all(html, " ");
        let text = self.comments.replace_all(&text, " ");
        let text = self.breaks.replace_all(&text, "\n");
        let text = self.tags.replace_all(&text, " ");
        let text = self.decode_entities(&text);

        let lines: Vec<String> = text
            .lines()
            .map(|line| self.spaces.replace_all(line, " ").trim().to_string())
            .collect();
        let joined = lines.join("\n");
        self.blank_lines
            .replace_all(joined.trim(), "\n\n")
            .into_owned()
    }

    fn decode_entities(&self, text: &str) -> String {
        let text = self.numeric_entity.replace_all(text, |caps: &regex::Captures<'_>| {
            let code = &caps[1];
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        });

        text.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#39;", "'")
            .replace("&rsquo;", "\u{2019}")
            .replace("&ldquo;", "\u{201c}")
            .replace("&rdquo;", "\u{201d}")
            .replace("&mdash;", "\u{2014}")
            .replace("&amp;", "&")
    }
}

/// Split text into chunks of `size` characters, each overlapping the
/// previous one by `overlap` characters
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Fetches pages over HTTP and returns their visible text
#[derive(Clone)]
pub struct WebScraper {
    client: Client,
    retry: RetryPolicy,
    cleaner: Arc<HtmlCleaner>,
}

impl WebScraper {
    /// Create a scraper from configuration
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout, USER_AGENT)?,
            retry: config.retry_policy(),
            cleaner: Arc::new(HtmlCleaner::new()?),
        })
    }

    /// The HTML reducer used by this scraper
    pub fn cleaner(&self) -> &HtmlCleaner {
        &self.cleaner
    }
}

#[async_trait]
impl PageFetcher for WebScraper {
    #[instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url)
            .map_err(|e| StockError::InvalidInput(format!("invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StockError::InvalidInput(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let (client, parsed) = (&self.client, &parsed);
        let html = self
            .retry
            .execute("web.fetch", || async move {
                let response = send(PROVIDER, client.get(parsed.clone())).await?;
                Ok::<_, StockError>(response.text().await?)
            })
            .await?;

        let text = self.cleaner.html_to_text(&html);
        debug!(url, html_len = html.len(), text_len = text.len(), "Scraped page");
        Ok(text)
    }
}

/// Summarize page text chunk by chunk and join the summaries with blank lines
pub async fn summarize_text(
    provider: &dyn LLMProvider,
    model: &str,
    max_tokens: usize,
    text: &str,
) -> Result<String> {
    let mut summaries = Vec::new();
    for chunk in chunk_text(text, SUMMARY_CHUNK_CHARS, 0) {
        let request = CompletionRequest::builder(model)
            .system(SUMMARY_SYSTEM_PROMPT)
            .add_message(Message::user(format!(
                "Analyze and summarize the content below, make sure to include the most relevant \
                 information in the summary, return only the summary nothing else.\n\nCONTENT\n----------\n{chunk}"
            )))
            .max_tokens(max_tokens)
            .temperature(0.1)
            .build();

        let response = provider.complete(request).await?;
        summaries.push(response.text().trim().to_string());
    }
    Ok(summaries.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let cleaner = HtmlCleaner::new().unwrap();
        let html = r#"<html><head><title>x</title><style>p { color: red; }</style></head>
            <body><script>var a = "<p>hidden</p>";</script>
            <h1>Apple   Q3 results</h1><!-- tracking -->
            <p>Revenue &amp; profit rose&nbsp;5%.</p><p>CEO said: &quot;great&quot; &#8212; &#x41;</p>
            <ul><li>iPhone</li><li>Mac</li></ul></body></html>"#;

        let text = cleaner.html_to_text(html);
        assert!(!text.contains("color"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains('<'));
        assert!(text.contains("Apple Q3 results"));
        assert!(text.contains("Revenue & profit rose 5%."));
        assert!(text.contains("CEO said: \"great\" \u{2014} A"));
        assert!(text.contains("iPhone\n"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn test_chunk_text_without_overlap() {
        let chunks = chunk_text("abcdefghij", 4, 0);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunk_text_with_overlap() {
        let chunks = chunk_text("abcdefghij", 4, 2);
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh", "ghij"]);
        assert!(chunk_text("", 4, 2).is_empty());
        assert_eq!(chunk_text("abc", 10, 5), vec!["abc"]);
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let scraper = WebScraper::new(&StockConfig::default()).unwrap();
        let err = scraper.fetch_text("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, StockError::InvalidInput(_)));
        let err = scraper.fetch_text("not a url").await.unwrap_err();
        assert!(matches!(err, StockError::InvalidInput(_)));
    }
}
