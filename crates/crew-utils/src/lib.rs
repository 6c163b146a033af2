//! Shared utilities for stock-crew
//!
//! Logging setup and the layered [`CrewSettings`] configuration
//! (defaults, then a TOML file, then environment variables).

pub mod logging;
pub mod settings;

pub use logging::{LogFormat, init_tracing};
pub use settings::{
    ConfigError, CrewMode, CrewSection, CrewSettings, DataSection, LlmProviderKind, LlmSection,
    ReportSection,
};
