use super::{commit_checked, StepOutcome, StepResult};
use crate::config::schema::string_literal;
use crate::config::EnvironmentPatch;
use crate::policy::{insert_after_delimiter, locate_after_delimiter};
use crate::store::DocumentStore;
use crate::ts::{find_node, NodeKind, SyntaxTree};

pub const ENVIRONMENT_TS: &str = "src/environments/environment.ts";
pub const ENVIRONMENT_HMR_TS: &str = "src/environments/environment.hmr.ts";

/// Name of the exported settings object in every environment file.
const ENVIRONMENT: &str = "environment";

/// Seed `environment.hmr.ts` with a copy of `environment.ts`.
pub fn copy_hmr_environment<S: DocumentStore + ?Sized>(store: &mut S) -> StepOutcome {
    if store.exists(ENVIRONMENT_HMR_TS) {
        return Ok(StepResult::AlreadyApplied {
            path: ENVIRONMENT_HMR_TS.to_string(),
        });
    }
    let Some(source) = store.read(ENVIRONMENT_TS)? else {
        return Ok(StepResult::skipped(format!("{ENVIRONMENT_TS} not found")));
    };
    store.create(ENVIRONMENT_HMR_TS, source)?;
    Ok(StepResult::Applied {
        path: ENVIRONMENT_HMR_TS.to_string(),
    })
}

/// Add `key: value` as the first property of the `environment` object.
pub fn add_environment_key<S: DocumentStore + ?Sized>(
    store: &mut S,
    patch: &EnvironmentPatch,
) -> StepOutcome {
    if !store.exists(&patch.file) {
        return Ok(StepResult::skipped(format!("{} not found", patch.file)));
    }

    let mut edits = store.begin_update(&patch.file)?;
    let tree = edits.parse()?;
    if declares_key(&tree, &patch.key) {
        return Ok(StepResult::AlreadyApplied {
            path: patch.file.clone(),
        });
    }

    let property = format!("\n  {}: {},", property_key(&patch.key), patch.value.to_literal());
    let placed = insert_after_delimiter(
        &mut edits,
        &tree,
        NodeKind::Identifier,
        ENVIRONMENT,
        NodeKind::OpenBrace,
        &property,
    );
    if placed.is_none() {
        return Ok(StepResult::skipped(format!(
            "no `{ENVIRONMENT}` object in {}",
            patch.file
        )));
    }

    commit_checked(store, edits)?;
    Ok(StepResult::Applied {
        path: patch.file.clone(),
    })
}

/// Keys that are not plain identifiers are written as string literals.
fn property_key(key: &str) -> String {
    if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        key.to_string()
    } else {
        string_literal(key)
    }
}

/// Whether the `environment` object already has a property named `key`.
fn declares_key(tree: &SyntaxTree, key: &str) -> bool {
    let Some((anchor, _)) =
        locate_after_delimiter(tree, NodeKind::Identifier, ENVIRONMENT, NodeKind::OpenBrace)
    else {
        return false;
    };
    let scope = anchor.parent().unwrap_or(anchor);
    let Some(object) = find_node(scope, NodeKind::Object, None) else {
        return false;
    };

    object.children().any(|member| {
        let name = match member.kind() {
            NodeKind::Pair => member.children().next(),
            kind if kind.as_str() == "shorthand_property_identifier" => Some(member),
            _ => None,
        };
        name.is_some_and(|name| {
            name.text() == property_key(key) || name.text().trim_matches(['"', '\'']) == key
        })
    })
}
