//! Prompt templates for the crew
//!
//! - `system`: role, goal and backstory of each crew member
//! - `tasks`: task descriptions, expected outputs and the date tip

mod system;
mod tasks;

pub use system::{AgentProfile, FINANCIAL_ANALYST, INVESTMENT_ADVISOR, RESEARCH_ANALYST};
pub use tasks::{StockTask, TaskPrompt, tip_section};

use crate::error::{Result, StockError};
use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;

/// Render a template string, failing on variables that were not supplied
pub(crate) fn render<S: Serialize>(name: &str, template: &str, vars: &S) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    env.render_str(template, Value::from_serialize(vars))
        .map(|text| text.trim().to_string())
        .map_err(|e| StockError::TemplateError(format!("{name}: {e}")))
}
