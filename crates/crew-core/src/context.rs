//! Execution context for a crew run
//!
//! The `Context` struct is a key-value store shared by every task of a run.
//! It carries the company under analysis, the run date and the outputs of
//! completed tasks so later agents can build on them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Company name or ticker under analysis
    pub const COMPANY: &str = "company";
    /// Run date (YYYY-MM-DD) rendered into task prompts
    pub const TODAY: &str = "today";
    /// Identifier of the current run, used in logs
    pub const RUN_ID: &str = "run_id";
    /// Prefix of the keys holding completed task outputs
    pub const TASK_OUTPUT_PREFIX: &str = "task_output.";
}

/// Context passed to agents during a crew run
///
/// # Example
///
/// ```
/// use crew_core::Context;
///
/// let mut ctx = Context::new()
///     .with_company("Apple")
///     .with_today("2024-05-01");
///
/// ctx.set_task_output("research", "AAPL looks busy");
/// assert_eq!(ctx.company(), Some("Apple"));
/// assert_eq!(ctx.task_output("research"), Some("AAPL looks busy"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Set the company under analysis
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.insert(keys::COMPANY, serde_json::json!(company.into()));
        self
    }

    /// Set the run date
    pub fn with_today(mut self, today: impl Into<String>) -> Self {
        self.insert(keys::TODAY, serde_json::json!(today.into()));
        self
    }

    /// Set the run identifier
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.insert(keys::RUN_ID, serde_json::json!(run_id.into()));
        self
    }

    // =========== Common Accessors ===========

    /// Get the company under analysis
    pub fn company(&self) -> Option<&str> {
        self.get(keys::COMPANY).and_then(|v| v.as_str())
    }

    /// Get the run date
    pub fn today(&self) -> Option<&str> {
        self.get(keys::TODAY).and_then(|v| v.as_str())
    }

    /// Get the run identifier
    pub fn run_id(&self) -> Option<&str> {
        self.get(keys::RUN_ID).and_then(|v| v.as_str())
    }

    /// Record the output of a completed task
    pub fn set_task_output(&mut self, task: &str, output: impl Into<String>) {
        self.insert(
            format!("{}{task}", keys::TASK_OUTPUT_PREFIX),
            serde_json::json!(output.into()),
        );
    }

    /// Get the output of a completed task
    pub fn task_output(&self, task: &str) -> Option<&str> {
        self.get(&format!("{}{task}", keys::TASK_OUTPUT_PREFIX))
            .and_then(|v| v.as_str())
    }

    /// Names of all tasks that have recorded an output
    pub fn completed_tasks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .data
            .keys()
            .filter_map(|k| k.strip_prefix(keys::TASK_OUTPUT_PREFIX))
            .collect();
        names.sort_unstable();
        names
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge another context into this one (other values override)
    pub fn merge(&mut self, other: Context) {
        self.data.extend(other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Snapshot {
        price: f64,
        symbol: String,
    }

    #[test]
    fn test_basic_operations() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.insert("key", serde_json::json!("value"));
        assert_eq!(ctx.len(), 1);
        assert!(ctx.contains_key("key"));
        assert_eq!(ctx.get("key"), Some(&serde_json::json!("value")));

        ctx.remove("key");
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_typed_insert_get() {
        let mut ctx = Context::new();
        let snap = Snapshot {
            price: 189.5,
            symbol: "AAPL".to_string(),
        };

        ctx.insert_typed("snapshot", &snap).unwrap();

        let retrieved: Snapshot = ctx.get_typed("snapshot").unwrap().unwrap();
        assert_eq!(retrieved, snap);
    }

    #[test]
    fn test_get_typed_wrong_shape() {
        let mut ctx = Context::new();
        ctx.insert("snapshot", serde_json::json!("not an object"));
        let result: crate::Result<Option<Snapshot>> = ctx.get_typed("snapshot");
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_chain() {
        let ctx = Context::new()
            .with_company("Tesla")
            .with_today("2024-05-01")
            .with_run_id("run-1");

        assert_eq!(ctx.company(), Some("Tesla"));
        assert_eq!(ctx.today(), Some("2024-05-01"));
        assert_eq!(ctx.run_id(), Some("run-1"));
    }

    #[test]
    fn test_task_outputs() {
        let mut ctx = Context::new();
        assert!(ctx.task_output("research").is_none());

        ctx.set_task_output("research", "news");
        ctx.set_task_output("financial_analysis", "numbers");

        assert_eq!(ctx.task_output("research"), Some("news"));
        assert_eq!(ctx.completed_tasks(), vec!["financial_analysis", "research"]);
    }

    #[test]
    fn test_merge() {
        let mut ctx1 = Context::new().with_company("Apple");
        let ctx2 = Context::new().with_company("Microsoft").with_today("2024-01-02");

        ctx1.merge(ctx2);
        assert_eq!(ctx1.company(), Some("Microsoft"));
        assert_eq!(ctx1.today(), Some("2024-01-02"));
    }
}
