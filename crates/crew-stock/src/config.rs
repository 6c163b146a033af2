//! Configuration for stock analysis operations

use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use crew_runtime::RuntimeConfig;
use crew_utils::{CrewMode, CrewSettings};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration injected into every adapter, agent and the crew
///
/// Built once at start-up, usually from [`CrewSettings`]; nothing below this
/// point reads the process environment.
#[derive(Debug, Clone)]
pub struct StockConfig {
    /// Google Serper API key
    pub serper_api_key: Option<String>,

    /// sec-api.io key; SEC EDGAR is queried directly when absent
    pub sec_api_key: Option<String>,

    /// User-Agent for SEC EDGAR requests
    pub sec_user_agent: String,

    /// Request timeout for data APIs
    pub request_timeout: Duration,

    /// Attempts per data request, including the first
    pub max_attempts: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Search hits and news items kept per query
    pub result_limit: usize,

    /// How agents obtain their data
    pub mode: CrewMode,

    /// Tool-loop limit per task in tools mode
    pub max_iterations: usize,

    /// Model used by every agent
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion size limit
    pub max_tokens: usize,

    /// Markdown report path; `None` disables the file
    pub report_path: Option<PathBuf>,

    /// Directory for chart artifacts
    pub chart_dir: PathBuf,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            sec_api_key: None,
            sec_user_agent: "stock-crew research-bot admin@example.com".to_string(),
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_backoff_base: Duration::from_secs(2),
            result_limit: 5,
            mode: CrewMode::Prefetch,
            max_iterations: 5,
            model: "mistral".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            report_path: Some(PathBuf::from("recommendation_report.md")),
            chart_dir: PathBuf::from("."),
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Build from resolved settings
    pub fn from_settings(settings: &CrewSettings) -> Result<Self> {
        let config = Self {
            serper_api_key: settings.data.serper_api_key.clone(),
            sec_api_key: settings.data.sec_api_key.clone(),
            sec_user_agent: settings.data.sec_user_agent.clone(),
            request_timeout: Duration::from_secs(settings.data.timeout_secs),
            max_attempts: settings.data.max_attempts,
            retry_backoff_base: Duration::from_millis(settings.data.retry_backoff_ms),
            result_limit: settings.data.result_limit,
            mode: settings.crew.mode,
            max_iterations: settings.crew.max_iterations,
            model: settings.llm.model.clone(),
            temperature: settings.llm.temperature,
            max_tokens: settings.llm.max_tokens,
            report_path: settings
                .report
                .write_file
                .then(|| settings.report.output.clone()),
            chart_dir: settings.report.chart_dir.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(StockError::ConfigError(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.result_limit == 0 {
            return Err(StockError::ConfigError(
                "result_limit must be greater than 0".to_string(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(StockError::ConfigError(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.sec_user_agent.trim().is_empty() {
            return Err(StockError::ConfigError(
                "SEC user agent must name a contact".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(StockError::ConfigError("model must not be empty".to_string()));
        }

        Ok(())
    }

    /// Retry policy shared by all data adapters
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.retry_backoff_base,
            self.retry_backoff_base * 8,
            2.0,
        )
    }

    /// Model defaults for the agent runtime
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            default_max_iterations: self.max_iterations,
            default_model: self.model.clone(),
            default_temperature: self.temperature,
            default_max_tokens: self.max_tokens,
        }
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    serper_api_key: Option<String>,
    sec_api_key: Option<String>,
    sec_user_agent: Option<String>,
    request_timeout: Option<Duration>,
    max_attempts: Option<u32>,
    retry_backoff_base: Option<Duration>,
    mode: Option<CrewMode>,
    model: Option<String>,
    report_path: Option<Option<PathBuf>>,
    chart_dir: Option<PathBuf>,
}

impl StockConfigBuilder {
    /// Set the Serper API key
    pub fn serper_api_key(mut self, key: impl Into<String>) -> Self {
        self.serper_api_key = Some(key.into());
        self
    }

    /// Set the sec-api.io key
    pub fn sec_api_key(mut self, key: impl Into<String>) -> Self {
        self.sec_api_key = Some(key.into());
        self
    }

    /// Set the SEC EDGAR User-Agent
    pub fn sec_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.sec_user_agent = Some(agent.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set attempts per request
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set the crew mode
    pub fn mode(mut self, mode: CrewMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the report path, `None` to skip writing the file
    pub fn report_path(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = Some(path);
        self
    }

    /// Set the chart directory
    pub fn chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            serper_api_key: self.serper_api_key,
            sec_api_key: self.sec_api_key,
            sec_user_agent: self.sec_user_agent.unwrap_or(defaults.sec_user_agent),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_backoff_base: self
                .retry_backoff_base
                .unwrap_or(defaults.retry_backoff_base),
            mode: self.mode.unwrap_or(defaults.mode),
            model: self.model.unwrap_or(defaults.model),
            report_path: self.report_path.unwrap_or(defaults.report_path),
            chart_dir: self.chart_dir.unwrap_or(defaults.chart_dir),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StockConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.mode, CrewMode::Prefetch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = StockConfig::builder()
            .max_attempts(5)
            .request_timeout(Duration::from_secs(60))
            .mode(CrewMode::Tools)
            .report_path(None)
            .build()
            .unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.mode, CrewMode::Tools);
        assert!(config.report_path.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let result = StockConfig::builder().max_attempts(0).build();
        assert!(matches!(result, Err(StockError::ConfigError(_))));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = CrewSettings::default();
        settings.data.serper_api_key = Some("key".to_string());
        settings.data.retry_backoff_ms = 500;
        settings.report.write_file = false;
        settings.llm.model = "llama3".to_string();

        let config = StockConfig::from_settings(&settings).unwrap();
        assert_eq!(config.serper_api_key.as_deref(), Some("key"));
        assert_eq!(config.retry_backoff_base, Duration::from_millis(500));
        assert_eq!(config.model, "llama3");
        assert!(config.report_path.is_none());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = StockConfig::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(2));
    }
}
