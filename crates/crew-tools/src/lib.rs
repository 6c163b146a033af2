//! Tool framework for stock-crew
//!
//! Tools are the data adapters (quotes, filings, search, scraping) exposed in
//! a form an LLM can call by name with JSON arguments.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
