//! Task definition

use crew_core::Agent;
use std::fmt;
use std::sync::Arc;

/// A unit of work assigned to one agent
///
/// The description and expected output are final text; any templating is
/// done by whoever builds the crew.
#[derive(Clone)]
pub struct Task {
    name: String,
    description: String,
    expected_output: String,
    agent: Arc<dyn Agent>,
    depends_on: Vec<String>,
}

impl Task {
    /// Create a task for an agent
    pub fn new(name: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            expected_output: String::new(),
            agent,
            depends_on: Vec::new(),
        }
    }

    /// Set the task description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the expected output statement
    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    /// Add a dependency on another task by name
    ///
    /// Naming the same task again has no effect.
    pub fn depends_on(mut self, task: impl Into<String>) -> Self {
        let task = task.into();
        if !self.depends_on.contains(&task) {
            self.depends_on.push(task);
        }
        self
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Agent assigned to the task
    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    /// Names of the tasks this task depends on
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    /// Compose the prompt sent to the agent
    ///
    /// `context` holds `(task name, output)` pairs of completed dependencies,
    /// in dependency declaration order.
    pub fn prompt(&self, context: &[(&str, &str)]) -> String {
        let mut prompt = self.description.trim().to_string();

        if !self.expected_output.is_empty() {
            prompt.push_str("\n\nExpected output: ");
            prompt.push_str(self.expected_output.trim());
        }

        if !context.is_empty() {
            prompt.push_str("\n\nContext from previous tasks:");
            for (name, output) in context {
                prompt.push_str(&format!("\n\n### {name}\n{}", output.trim()));
            }
        }

        prompt
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("agent", &self.agent.name())
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
