use super::json::PACKAGE_JSON;
use super::{StepError, StepOutcome, StepResult};
use crate::store::DocumentStore;
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Work deferred until the documents have been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    NodePackageInstall { package: String },
}

impl Task {
    fn command(&self) -> Command {
        match self {
            Task::NodePackageInstall { package } => {
                let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
                let mut command = Command::new(npm);
                command.arg("install").arg(package);
                command
            }
        }
    }

    /// Run the task with `workspace` as the working directory.
    pub fn run(&self, workspace: &Path) -> Result<(), TaskError> {
        tracing::info!(task = %self, workspace = %workspace.display(), "running task");
        let status = self
            .command()
            .current_dir(workspace)
            .status()
            .map_err(|source| TaskError::Spawn {
                task: self.to_string(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(TaskError::Failed {
                task: self.to_string(),
                status,
            })
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::NodePackageInstall { package } => write!(f, "npm install {package}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("cannot start `{task}`: {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{task}` exited with {status}")]
    Failed { task: String, status: ExitStatus },
}

/// Per-run state shared by the steps.
#[derive(Debug, Default)]
pub struct Context {
    tasks: Vec<Task>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` unless an identical one is already queued.
    pub fn add_task(&mut self, task: Task) {
        if !self.tasks.contains(&task) {
            tracing::debug!(%task, "queued task");
            self.tasks.push(task);
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn take_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.tasks)
    }
}

/// Queue an install of `package` unless `package.json` already depends on it.
pub fn install_package<S: DocumentStore + ?Sized>(
    store: &S,
    ctx: &mut Context,
    package: &str,
) -> StepOutcome {
    if let Some(text) = store.read(PACKAGE_JSON)? {
        let manifest: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| StepError::Json {
                path: PACKAGE_JSON.to_string(),
                source,
            })?;
        let declared = ["dependencies", "devDependencies"]
            .iter()
            .any(|section| manifest.get(section).and_then(|deps| deps.get(package)).is_some());
        if declared {
            return Ok(StepResult::AlreadyApplied {
                path: PACKAGE_JSON.to_string(),
            });
        }
    }

    ctx.add_task(Task::NodePackageInstall {
        package: package.to_string(),
    });
    Ok(StepResult::Applied {
        path: PACKAGE_JSON.to_string(),
    })
}
