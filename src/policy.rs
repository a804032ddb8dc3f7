//! Targeted insertion: find a named construct, insert right after its first
//! opening delimiter.
//!
//! Built only from [`find_node`]/[`find_nodes`] and
//! [`EditSet::insert_right`]; the committer knows nothing about it.

use crate::edit::EditSet;
use crate::ts::{find_node, find_nodes, NodeKind, SyntaxNode, SyntaxTree};

/// Where a targeted insertion landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Span start of the named node.
    pub anchor: usize,
    /// Offset the text was inserted at (end of the delimiter token).
    pub at: usize,
}

/// Locate the delimiter a targeted insertion would use, without queuing it.
///
/// The delimiter is searched in the construct the name belongs to: the named
/// node's parent when it has one (an identifier never contains a brace
/// itself), otherwise the node.
pub fn locate_after_delimiter<'t>(
    tree: &'t SyntaxTree,
    kind: NodeKind,
    name: &str,
    delimiter: NodeKind,
) -> Option<(SyntaxNode<'t>, SyntaxNode<'t>)> {
    let anchor = find_node(tree.root(), kind, Some(name))?;
    let scope = anchor.parent().unwrap_or(anchor);
    let delimiter = find_nodes(scope, delimiter, Some(1)).into_iter().next()?;
    Some((anchor, delimiter))
}

/// Insert `text` right after the first `delimiter` token of the construct
/// named `name`.
///
/// Returns `None` and queues nothing when the node or the delimiter is absent.
pub fn insert_after_delimiter(
    edits: &mut EditSet,
    tree: &SyntaxTree,
    kind: NodeKind,
    name: &str,
    delimiter: NodeKind,
    text: &str,
) -> Option<Placement> {
    debug_assert!(edits.is_snapshot_of(tree), "tree was not parsed from this edit set");

    let Some((anchor, token)) = locate_after_delimiter(tree, kind, name, delimiter) else {
        tracing::debug!(path = edits.path(), %kind, name, %delimiter, "insertion anchor not found");
        return None;
    };

    let at = token.pos() + token.span().len();
    edits.insert_right(at, text);
    Some(Placement {
        anchor: anchor.pos(),
        at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_TS: &str = "export const environment = {\n  production: false\n};\n";

    fn run(source: &str, name: &str, text: &str) -> (Option<Placement>, String) {
        let mut edits = EditSet::new("env.ts", source);
        let tree = edits.parse().unwrap();
        let placement = insert_after_delimiter(
            &mut edits,
            &tree,
            NodeKind::Identifier,
            name,
            NodeKind::OpenBrace,
            text,
        );
        (placement, edits.commit().unwrap())
    }

    #[test]
    fn inserts_after_opening_brace_of_named_object() {
        let (placement, out) = run(ENV_TS, "environment", "\n  hmr: true,");

        assert_eq!(
            placement,
            Some(Placement {
                anchor: 13,
                at: 28
            })
        );
        assert_eq!(
            out,
            "export const environment = {\n  hmr: true,\n  production: false\n};\n"
        );
    }

    #[test]
    fn missing_name_queues_nothing() {
        let mut edits = EditSet::new("env.ts", ENV_TS);
        let tree = edits.parse().unwrap();

        let placement = insert_after_delimiter(
            &mut edits,
            &tree,
            NodeKind::Identifier,
            "settings",
            NodeKind::OpenBrace,
            "x",
        );
        assert_eq!(placement, None);
        assert!(edits.is_empty());
        assert_eq!(edits.commit().unwrap(), ENV_TS);
    }

    #[test]
    fn missing_delimiter_queues_nothing() {
        let (placement, out) = run("export const environment = 42;\n", "environment", "x");
        assert_eq!(placement, None);
        assert_eq!(out, "export const environment = 42;\n");
    }

    #[test]
    fn first_delimiter_wins_for_nested_objects() {
        let source = "const environment = { nested: { deep: 1 } };";
        let (_, out) = run(source, "environment", " a: 0,");
        assert_eq!(out, "const environment = { a: 0, nested: { deep: 1 } };");
    }
}
