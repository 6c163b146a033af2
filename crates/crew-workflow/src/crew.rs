//! Crew definition and execution

use crate::error::{Result, WorkflowError};
use crate::task::Task;
use crew_core::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, instrument};

/// Output of one completed task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    /// Task name
    pub name: String,
    /// Name of the agent that ran it
    pub agent: String,
    /// Agent answer
    pub output: String,
}

/// Outputs of a whole crew run, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    /// Completed tasks in the order they ran
    pub tasks: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Output of the last task
    pub fn final_output(&self) -> &str {
        self.tasks.last().map_or("", |t| t.output.as_str())
    }

    /// Output of a task by name
    pub fn get(&self, task: &str) -> Option<&str> {
        self.tasks
            .iter()
            .find(|t| t.name == task)
            .map(|t| t.output.as_str())
    }
}

/// A validated set of tasks with a fixed execution order
///
/// ```no_run
/// use crew_core::Context;
/// use crew_workflow::{Crew, Task};
/// # use std::sync::Arc;
/// # async fn example(researcher: Arc<dyn crew_core::Agent>, advisor: Arc<dyn crew_core::Agent>) -> crew_workflow::Result<()> {
/// let crew = Crew::builder()
///     .add_task(Task::new("research", researcher).description("Collect news"))
///     .add_task(Task::new("recommend", advisor).description("Advise").depends_on("research"))
///     .build()?;
///
/// let mut context = Context::new().with_company("Apple");
/// let output = crew.kickoff(&mut context).await?;
/// println!("{}", output.final_output());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Crew {
    tasks: Vec<Task>,
    order: Vec<usize>,
}

impl Crew {
    /// Create a new crew builder
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    /// Task names in execution order
    pub fn execution_order(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.tasks[i].name()).collect()
    }

    /// Run every task, one at a time, in dependency order
    ///
    /// Each task output is recorded in `context` under its task name before
    /// the next task starts. The first agent failure aborts the run.
    #[instrument(skip_all, fields(company = context.company().unwrap_or_default()))]
    pub async fn kickoff(&self, context: &mut Context) -> Result<CrewOutput> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (step, &index) in self.order.iter().enumerate() {
            let task = &self.tasks[index];
            let deps: Vec<(&str, &str)> = task
                .dependencies()
                .iter()
                .filter_map(|dep| {
                    outputs
                        .iter()
                        .find(|o| &o.name == dep)
                        .map(|o| (o.name.as_str(), o.output.as_str()))
                })
                .collect();
            let prompt = task.prompt(&deps);

            info!(
                step = step + 1,
                total = self.order.len(),
                task = task.name(),
                agent = task.agent().name(),
                "Starting task"
            );
            let started = Instant::now();

            let output = task
                .agent()
                .process(prompt, context)
                .await
                .map_err(|source| WorkflowError::TaskFailed {
                    task: task.name().to_string(),
                    source,
                })?;

            info!(
                task = task.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                output_length = output.len(),
                "Task completed"
            );

            context.set_task_output(task.name(), output.clone());
            outputs.push(TaskOutput {
                name: task.name().to_string(),
                agent: task.agent().name().to_string(),
                output,
            });
        }

        Ok(CrewOutput { tasks: outputs })
    }
}

/// Builder for constructing crews
#[derive(Default)]
pub struct CrewBuilder {
    tasks: Vec<Task>,
}

impl CrewBuilder {
    /// Create a new crew builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task; declaration order breaks ties between independent tasks
    pub fn add_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Validate the task graph and fix the execution order
    pub fn build(self) -> Result<Crew> {
        if self.tasks.is_empty() {
            return Err(WorkflowError::Empty);
        }

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.tasks.len());
        for (i, task) in self.tasks.iter().enumerate() {
            if index.insert(task.name(), i).is_some() {
                return Err(WorkflowError::DuplicateTask(task.name().to_string()));
            }
        }

        let mut indegree = vec![0usize; self.tasks.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.tasks.len()];
        for (i, task) in self.tasks.iter().enumerate() {
            for dep in task.dependencies() {
                let &d = index
                    .get(dep.as_str())
                    .ok_or_else(|| WorkflowError::UnknownDependency {
                        task: task.name().to_string(),
                        dependency: dep.clone(),
                    })?;
                indegree[i] += 1;
                dependents[d].push(i);
            }
        }

        // Kahn's algorithm, always taking the earliest declared ready task.
        let mut order = Vec::with_capacity(self.tasks.len());
        let mut done = vec![false; self.tasks.len()];
        while let Some(next) = (0..self.tasks.len()).find(|&i| !done[i] && indegree[i] == 0) {
            done[next] = true;
            order.push(next);
            for &dependent in &dependents[next] {
                indegree[dependent] -= 1;
            }
        }

        if order.len() != self.tasks.len() {
            let stuck = self
                .tasks
                .iter()
                .enumerate()
                .filter(|(i, _)| !done[*i])
                .map(|(_, t)| t.name().to_string())
                .collect();
            return Err(WorkflowError::Cycle(stuck));
        }

        Ok(Crew {
            tasks: self.tasks,
            order,
        })
    }
}
