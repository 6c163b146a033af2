//! Crew orchestration for stock-crew
//!
//! A [`Crew`] is a set of [`Task`]s, each bound to an agent and optionally
//! depending on other tasks. Tasks run one at a time in dependency order and
//! every task sees the outputs of the tasks it depends on.

pub mod crew;
pub mod error;
pub mod task;

pub use crew::{Crew, CrewBuilder, CrewOutput, TaskOutput};
pub use error::{Result, WorkflowError};
pub use task::Task;
