//! Layered configuration for a crew run
//!
//! Settings are resolved once at start-up and then passed down explicitly:
//! built-in defaults, then an optional `stock-crew.toml`, then environment
//! variables (a `.env` file is loaded into the environment first). Command
//! line flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "stock-crew.toml";

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for these settings
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which LLM backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI or an OpenAI-compatible server
    OpenAi,
}

impl std::str::FromStr for LlmProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "open_ai" | "lmstudio" => Ok(Self::OpenAi),
            other => Err(ConfigError::Invalid(format!("unknown LLM provider '{other}'"))),
        }
    }
}

/// How agents get their data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewMode {
    /// Fetch data first, then make one LLM call per task
    #[default]
    Prefetch,
    /// Let the LLM call the data adapters as tools
    Tools,
}

impl std::str::FromStr for CrewMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefetch" => Ok(Self::Prefetch),
            "tools" => Ok(Self::Tools),
            other => Err(ConfigError::Invalid(format!("unknown crew mode '{other}'"))),
        }
    }
}

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewSettings {
    /// LLM settings
    #[serde(default)]
    pub llm: LlmSection,

    /// Data adapter settings
    #[serde(default)]
    pub data: DataSection,

    /// Report output settings
    #[serde(default)]
    pub report: ReportSection,

    /// Orchestration settings
    #[serde(default)]
    pub crew: CrewSection,
}

/// LLM settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// Backend kind
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Endpoint override for either provider
    #[serde(default)]
    pub base_url: Option<String>,

    /// Ollama endpoint, preferred over `base_url` for Ollama
    #[serde(default)]
    pub ollama_base_url: Option<String>,

    /// OpenAI-compatible endpoint, preferred over `base_url` for OpenAI
    #[serde(default)]
    pub openai_api_base: Option<String>,

    /// API key for OpenAI-compatible endpoints
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion size limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl LlmSection {
    /// Endpoint for the selected provider, `None` for the provider default
    ///
    /// Resolved on use so a provider chosen after the environment was read
    /// still gets its own endpoint.
    pub fn endpoint(&self) -> Option<&str> {
        let specific = match self.provider {
            LlmProviderKind::Ollama => &self.ollama_base_url,
            LlmProviderKind::OpenAi => &self.openai_api_base,
        };
        specific.as_deref().or(self.base_url.as_deref())
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            model: default_model(),
            base_url: None,
            ollama_base_url: None,
            openai_api_base: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_model() -> String {
    "mistral".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> usize {
    2048
}

fn default_llm_timeout() -> u64 {
    180
}

/// Data adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    /// Google Serper API key
    #[serde(default, skip_serializing)]
    pub serper_api_key: Option<String>,

    /// sec-api.io key; EDGAR is used directly when absent
    #[serde(default, skip_serializing)]
    pub sec_api_key: Option<String>,

    /// User-Agent sent to SEC EDGAR (must name a contact)
    #[serde(default = "default_sec_user_agent")]
    pub sec_user_agent: String,

    /// HTTP timeout for data APIs in seconds
    #[serde(default = "default_data_timeout")]
    pub timeout_secs: u64,

    /// Attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Number of search hits and news items kept
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            sec_api_key: None,
            sec_user_agent: default_sec_user_agent(),
            timeout_secs: default_data_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            result_limit: default_result_limit(),
        }
    }
}

fn default_sec_user_agent() -> String {
    "stock-crew research-bot admin@example.com".to_string()
}

fn default_data_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_result_limit() -> usize {
    5
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    /// Markdown report path
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Whether to write the report file at all
    #[serde(default = "default_true")]
    pub write_file: bool,

    /// Directory for chart artifacts
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            output: default_output(),
            write_file: true,
            chart_dir: default_chart_dir(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("recommendation_report.md")
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewSection {
    /// Data access mode
    #[serde(default)]
    pub mode: CrewMode,

    /// Tool-loop limit per task in tools mode
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for CrewSection {
    fn default() -> Self {
        Self {
            mode: CrewMode::default(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> usize {
    5
}

impl CrewSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve settings for a run
    ///
    /// Uses `path` when given, else `stock-crew.toml` if it exists, else the
    /// defaults; then applies `.env` and process environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_dotenv();

        let mut settings = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        settings.apply_env(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(provider) = lookup("STOCK_CREW_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(model) = lookup("STOCK_CREW_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.ollama_base_url = Some(url);
        }
        if let Some(url) = lookup("OPENAI_API_BASE") {
            self.llm.openai_api_base = Some(url);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }

        if let Some(key) = lookup("SERPER_API_KEY").or_else(|| lookup("GOOGLE_SERPER_API_KEY")) {
            self.data.serper_api_key = Some(key);
        }
        if let Some(key) = lookup("SEC_API_API_KEY") {
            self.data.sec_api_key = Some(key);
        }
        if let Some(agent) = lookup("SEC_USER_AGENT") {
            self.data.sec_user_agent = agent;
        }

        if let Some(output) = lookup("STOCK_CREW_OUTPUT") {
            self.report.output = PathBuf::from(output);
        }
        if let Some(mode) = lookup("STOCK_CREW_MODE") {
            self.crew.mode = mode.parse()?;
        }
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.data.max_attempts == 0 {
            return Err(ConfigError::Invalid("data.max_attempts must be at least 1".into()));
        }
        if self.data.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".into()));
        }
        if self.crew.max_iterations == 0 {
            return Err(ConfigError::Invalid("crew.max_iterations must be at least 1".into()));
        }
        Ok(())
    }

    /// Default settings rendered as TOML (secrets are never written)
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Load `.env` from the working directory into the process environment
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = CrewSettings::default();
        assert_eq!(settings.llm.provider, LlmProviderKind::Ollama);
        assert_eq!(settings.llm.model, "mistral");
        assert!((settings.llm.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.data.max_attempts, 3);
        assert_eq!(settings.report.output, PathBuf::from("recommendation_report.md"));
        assert_eq!(settings.crew.mode, CrewMode::Prefetch);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let settings: CrewSettings = toml::from_str(
            r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
base_url = "http://localhost:1234/v1"

[crew]
mode = "tools"
"#,
        )
        .unwrap();

        assert_eq!(settings.llm.provider, LlmProviderKind::OpenAi);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.crew.mode, CrewMode::Tools);
        assert_eq!(settings.data.timeout_secs, 30);
    }

    #[test]
    fn test_load_file_and_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\noutput = \"out/report.md\"\nwrite_file = false").unwrap();
        let settings = CrewSettings::load(file.path()).unwrap();
        assert_eq!(settings.report.output, PathBuf::from("out/report.md"));
        assert!(!settings.report.write_file);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[llm\nmodel = ").unwrap();
        assert!(matches!(
            CrewSettings::load(bad.path()),
            Err(ConfigError::Parse { .. })
        ));

        assert!(matches!(
            CrewSettings::load(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = CrewSettings::default();
        settings
            .apply_env(env(&[
                ("STOCK_CREW_PROVIDER", "openai"),
                ("OPENAI_API_BASE", "http://localhost:1234/v1"),
                ("OLLAMA_BASE_URL", "http://ignored:11434"),
                ("OPENAI_API_KEY", "sk-test"),
                ("GOOGLE_SERPER_API_KEY", "serper"),
                ("SEC_API_API_KEY", "sec"),
                ("STOCK_CREW_MODE", "tools"),
            ]))
            .unwrap();

        assert_eq!(settings.llm.provider, LlmProviderKind::OpenAi);
        assert_eq!(settings.llm.endpoint(), Some("http://localhost:1234/v1"));
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.data.serper_api_key.as_deref(), Some("serper"));
        assert_eq!(settings.data.sec_api_key.as_deref(), Some("sec"));
        assert_eq!(settings.crew.mode, CrewMode::Tools);
    }

    #[test]
    fn test_endpoint_follows_provider_switched_after_env() {
        let mut settings = CrewSettings::default();
        settings
            .apply_env(env(&[
                ("OLLAMA_BASE_URL", "http://localhost:11434"),
                ("OPENAI_API_BASE", "http://localhost:1234/v1"),
            ]))
            .unwrap();
        assert_eq!(settings.llm.endpoint(), Some("http://localhost:11434"));

        settings.llm.provider = LlmProviderKind::OpenAi;
        assert_eq!(settings.llm.endpoint(), Some("http://localhost:1234/v1"));
    }

    #[test]
    fn test_generic_base_url_is_a_fallback() {
        let mut settings = CrewSettings::default();
        assert_eq!(settings.llm.endpoint(), None);

        settings.llm.base_url = Some("http://gpu-box:8080".to_string());
        assert_eq!(settings.llm.endpoint(), Some("http://gpu-box:8080"));

        settings.llm.ollama_base_url = Some("http://gpu-box:11434".to_string());
        assert_eq!(settings.llm.endpoint(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_serper_key_precedence() {
        let mut settings = CrewSettings::default();
        settings
            .apply_env(env(&[
                ("SERPER_API_KEY", "primary"),
                ("GOOGLE_SERPER_API_KEY", "alias"),
            ]))
            .unwrap();
        assert_eq!(settings.data.serper_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_bad_env_value() {
        let mut settings = CrewSettings::default();
        let err = settings
            .apply_env(env(&[("STOCK_CREW_PROVIDER", "anthropic")]))
            .unwrap_err();
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn test_validation() {
        let mut settings = CrewSettings::default();
        settings.llm.temperature = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = CrewSettings::default();
        settings.data.max_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_default_toml_has_no_secrets() {
        let rendered = CrewSettings::default_toml();
        assert!(rendered.contains("[llm]"));
        assert!(rendered.contains("[report]"));
        assert!(!rendered.contains("api_key"));
    }
}
