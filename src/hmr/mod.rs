//! Enabling Angular hot module replacement in a workspace.
//!
//! [`Schematic::run`] walks a fixed list of steps over any [`DocumentStore`].
//! Each step is independent: it reports [`StepResult::Applied`],
//! [`StepResult::AlreadyApplied`] or [`StepResult::Skipped`], or an error that
//! does not stop the steps after it. Running twice is a no-op the second time.

mod bootstrap;
mod environment;
mod json;
mod task;
mod template;

pub use bootstrap::{insert_import, patch_main, MAIN_TS};
pub use environment::{add_environment_key, copy_hmr_environment, ENVIRONMENT_HMR_TS, ENVIRONMENT_TS};
pub use json::{patch_angular_json, patch_package_json, patch_tsconfig_app, ANGULAR_JSON, PACKAGE_JSON, TSCONFIG_APP};
pub use task::{install_package, Context, Task, TaskError};
pub use template::{render, TemplateFile, TemplateSource, HMR_TS_TEMPLATE};

use crate::config::{angular_core_version, matches_requirement, HmrConfig, VersionError};
use crate::edit::EditSet;
use crate::store::{DocumentStore, StoreError};
use crate::ts::{check_patched, SyntaxCheck, TreeSitterError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Applied { path: String },
    AlreadyApplied { path: String },
    Skipped { reason: String },
}

impl StepResult {
    pub(crate) fn skipped(reason: impl Into<String>) -> Self {
        StepResult::Skipped {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepResult::Applied { path } => write!(f, "applied to {path}"),
            StepResult::AlreadyApplied { path } => write!(f, "already applied to {path}"),
            StepResult::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] TreeSitterError),

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected structure in {path}: {message}")]
    Shape { path: String, message: String },

    #[error("template {path}: {message}")]
    Template { path: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Version(#[from] VersionError),
}

pub type StepOutcome = Result<StepResult, StepError>;

/// Ordered per-step outcomes of one run.
#[derive(Debug, Default)]
pub struct Report {
    pub steps: Vec<(String, StepOutcome)>,
}

impl Report {
    fn record(&mut self, id: impl Into<String>, outcome: StepOutcome) {
        let id = id.into();
        match &outcome {
            Ok(StepResult::Skipped { reason }) => tracing::warn!(step = %id, %reason, "step skipped"),
            Ok(result) => tracing::info!(step = %id, %result, "step finished"),
            Err(error) => tracing::error!(step = %id, %error, "step failed"),
        }
        self.steps.push((id, outcome));
    }

    pub fn has_errors(&self) -> bool {
        self.steps.iter().any(|(_, outcome)| outcome.is_err())
    }

    pub fn count(&self, predicate: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }

    pub fn outcome(&self, id: &str) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(step, _)| step == id)
            .map(|(_, outcome)| outcome)
    }
}

/// The HMR setup, parameterized by the options file and template source.
#[derive(Debug)]
pub struct Schematic<'a> {
    config: &'a HmrConfig,
    templates: TemplateSource,
}

impl<'a> Schematic<'a> {
    pub fn new(config: &'a HmrConfig) -> Self {
        Self {
            config,
            templates: TemplateSource::Embedded,
        }
    }

    pub fn with_templates(mut self, templates: TemplateSource) -> Self {
        self.templates = templates;
        self
    }

    pub fn run<S: DocumentStore + ?Sized>(&self, store: &mut S, ctx: &mut Context) -> Report {
        let mut report = Report::default();

        match version_gate(store, self.config) {
            Ok(None) => {}
            Ok(Some(reason)) => {
                for id in self.step_ids() {
                    report.record(id, Ok(StepResult::skipped(reason.as_str())));
                }
                return report;
            }
            Err(error) => {
                report.record("version-gate", Err(error));
                return report;
            }
        }

        report.record(
            "install-package",
            install_package(store, ctx, &self.config.install.package),
        );
        report.record("angular-json", patch_angular_json(store));
        report.record("package-json", patch_package_json(store, &self.config.serve.script));
        report.record("tsconfig-app", patch_tsconfig_app(store));
        report.record("environment-hmr", copy_hmr_environment(store));
        for env in &self.config.environments {
            report.record(format!("environment:{}", env.file), add_environment_key(store, env));
        }
        report.record("main-ts", patch_main(store));

        match self.templates.load() {
            Ok(files) => {
                let values = self.config.template_values();
                for file in files {
                    let outcome = file.create_in(store, &values);
                    report.record(format!("template:{}", file.path), outcome);
                }
            }
            Err(error) => report.record("templates", Err(error)),
        }

        report
    }

    fn step_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = ["install-package", "angular-json", "package-json", "tsconfig-app", "environment-hmr"]
            .iter()
            .map(|id| id.to_string())
            .collect();
        ids.extend(self.config.environments.iter().map(|env| format!("environment:{}", env.file)));
        ids.push("main-ts".to_string());
        ids.push("templates".to_string());
        ids
    }
}

/// `Some(reason)` when the workspace's Angular version is outside
/// `meta.version_range`.
fn version_gate<S: DocumentStore + ?Sized>(
    store: &S,
    config: &HmrConfig,
) -> Result<Option<String>, StepError> {
    let Some(range) = config
        .meta
        .version_range
        .as_deref()
        .filter(|range| !range.trim().is_empty())
    else {
        return Ok(None);
    };

    let Some(text) = store.read(PACKAGE_JSON)? else {
        return Ok(Some(format!("{PACKAGE_JSON} not found, cannot check @angular/core")));
    };
    let package: serde_json::Value = serde_json::from_str(&text).map_err(|source| StepError::Json {
        path: PACKAGE_JSON.to_string(),
        source,
    })?;
    let Some(version) = angular_core_version(&package) else {
        return Ok(Some(format!("no @angular/core version in {PACKAGE_JSON}")));
    };

    if matches_requirement(&version, Some(range))? {
        tracing::debug!(%version, %range, "angular version accepted");
        Ok(None)
    } else {
        Ok(Some(format!("@angular/core {version} does not satisfy {range}")))
    }
}

/// Commit `edits` and warn when the patched text gained syntax errors.
fn commit_checked<S: DocumentStore + ?Sized>(store: &mut S, edits: EditSet) -> Result<(), StepError> {
    let path = edits.path().to_string();
    let original = edits.original().to_string();
    store.commit_update(edits)?;

    let patched = store.read_to_string(&path)?;
    if let SyntaxCheck::Introduced(spans) = check_patched(&original, &patched)? {
        tracing::warn!(
            %path,
            errors = spans.len(),
            first = ?spans.first(),
            "patched document does not parse cleanly"
        );
    }
    Ok(())
}
