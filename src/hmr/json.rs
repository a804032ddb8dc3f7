//! Workspace JSON edits: `angular.json`, `package.json`, `tsconfig.app.json`.
//!
//! Documents are re-serialized as two-space pretty JSON with key order kept.
//! A document whose value is unchanged is reported as already applied and
//! not written.

use super::environment::{ENVIRONMENT_HMR_TS, ENVIRONMENT_TS};
use super::{StepError, StepOutcome, StepResult};
use crate::store::DocumentStore;
use serde_json::{json, Map, Value};

pub const ANGULAR_JSON: &str = "angular.json";
pub const PACKAGE_JSON: &str = "package.json";
pub const TSCONFIG_APP: &str = "src/tsconfig.app.json";

/// Add the `hmr` build and serve configurations to the default project.
pub fn patch_angular_json<S: DocumentStore + ?Sized>(store: &mut S) -> StepOutcome {
    update_json(store, ANGULAR_JSON, |root| {
        let doc = as_object(root, ANGULAR_JSON, "document")?;
        let Some(project_name) = doc
            .get("defaultProject")
            .and_then(Value::as_str)
            .map(str::to_owned)
        else {
            return Ok(Some(format!("{ANGULAR_JSON} has no defaultProject")));
        };

        let architect = doc
            .get_mut("projects")
            .and_then(|projects| projects.get_mut(project_name.as_str()))
            .and_then(|project| project.get_mut("architect"))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| shape(ANGULAR_JSON, format!("project `{project_name}` has no architect")))?;

        let build = target(architect, "build")?;
        child_object(build, "configurations", ANGULAR_JSON)?.insert(
            "hmr".to_string(),
            json!({
                "fileReplacements": [
                    { "replace": ENVIRONMENT_TS, "with": ENVIRONMENT_HMR_TS }
                ]
            }),
        );

        let serve = target(architect, "serve")?;
        child_object(serve, "configurations", ANGULAR_JSON)?.insert(
            "hmr".to_string(),
            json!({
                "hmr": true,
                "browserTarget": format!("{project_name}:build:hmr")
            }),
        );
        Ok(None)
    })
}

/// Ensure an `hmr` npm script exists; an existing one is kept.
pub fn patch_package_json<S: DocumentStore + ?Sized>(store: &mut S, script: &str) -> StepOutcome {
    update_json(store, PACKAGE_JSON, |root| {
        let doc = as_object(root, PACKAGE_JSON, "document")?;
        let scripts = child_object(doc, "scripts", PACKAGE_JSON)?;
        let present = scripts
            .get("hmr")
            .and_then(Value::as_str)
            .is_some_and(|existing| !existing.is_empty());
        if !present {
            scripts.insert("hmr".to_string(), Value::String(script.to_string()));
        }
        Ok(None)
    })
}

/// Ensure `"node"` is listed in `compilerOptions.types`, for `module.hot`.
pub fn patch_tsconfig_app<S: DocumentStore + ?Sized>(store: &mut S) -> StepOutcome {
    update_json(store, TSCONFIG_APP, |root| {
        let doc = as_object(root, TSCONFIG_APP, "document")?;
        let options = child_object(doc, "compilerOptions", TSCONFIG_APP)?;
        let types = options
            .entry("types")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| shape(TSCONFIG_APP, "`compilerOptions.types` is not an array"))?;
        if !types.iter().any(|entry| entry.as_str() == Some("node")) {
            types.push(Value::String("node".to_string()));
        }
        Ok(None)
    })
}

/// Parse `path`, let `edit` change it, and write it back when it changed.
///
/// `edit` returns `Some(reason)` to skip the step without writing.
fn update_json<S, F>(store: &mut S, path: &str, edit: F) -> StepOutcome
where
    S: DocumentStore + ?Sized,
    F: FnOnce(&mut Value) -> Result<Option<String>, StepError>,
{
    let Some(text) = store.read(path)? else {
        return Ok(StepResult::skipped(format!("{path} not found")));
    };
    let original: Value = serde_json::from_str(&text).map_err(|source| StepError::Json {
        path: path.to_string(),
        source,
    })?;

    let mut value = original.clone();
    if let Some(reason) = edit(&mut value)? {
        return Ok(StepResult::Skipped { reason });
    }
    if value == original {
        return Ok(StepResult::AlreadyApplied {
            path: path.to_string(),
        });
    }

    let mut rendered = serde_json::to_string_pretty(&value).map_err(|source| StepError::Json {
        path: path.to_string(),
        source,
    })?;
    if text.ends_with('\n') {
        rendered.push('\n');
    }
    store.overwrite(path, rendered)?;
    tracing::debug!(%path, "updated JSON document");
    Ok(StepResult::Applied {
        path: path.to_string(),
    })
}

fn as_object<'v>(
    value: &'v mut Value,
    path: &str,
    what: &str,
) -> Result<&'v mut Map<String, Value>, StepError> {
    value
        .as_object_mut()
        .ok_or_else(|| shape(path, format!("{what} is not an object")))
}

/// The object under `key`, created empty when absent.
fn child_object<'v>(
    parent: &'v mut Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'v mut Map<String, Value>, StepError> {
    parent
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| shape(path, format!("`{key}` is not an object")))
}

fn target<'v>(
    architect: &'v mut Map<String, Value>,
    name: &str,
) -> Result<&'v mut Map<String, Value>, StepError> {
    architect
        .get_mut(name)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| shape(ANGULAR_JSON, format!("no `{name}` architect target")))
}

fn shape(path: &str, message: impl Into<String>) -> StepError {
    StepError::Shape {
        path: path.to_string(),
        message: message.into(),
    }
}
