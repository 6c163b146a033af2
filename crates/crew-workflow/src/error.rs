//! Error types for crew orchestration

use thiserror::Error;

/// Result type alias for crew-workflow
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors raised while assembling or running a crew
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A crew needs at least one task
    #[error("crew has no tasks")]
    Empty,

    /// Two tasks share a name
    #[error("duplicate task name '{0}'")]
    DuplicateTask(String),

    /// A task depends on a task that does not exist
    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency {
        /// Task declaring the dependency
        task: String,
        /// Missing dependency name
        dependency: String,
    },

    /// The dependency graph contains a cycle through these tasks
    #[error("dependency cycle between tasks: {}", .0.join(", "))]
    Cycle(Vec<String>),

    /// An agent failed while running a task
    #[error("task '{task}' failed: {source}")]
    TaskFailed {
        /// Failing task
        task: String,
        /// Underlying agent error
        #[source]
        source: crew_core::Error,
    },
}

impl From<WorkflowError> for crew_core::Error {
    fn from(err: WorkflowError) -> Self {
        crew_core::Error::ProcessingFailed(err.to_string())
    }
}
