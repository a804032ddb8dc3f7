//! Node queries over an immutable [`SyntaxTree`](crate::ts::SyntaxTree).
//!
//! All traversals are depth-first pre-order (parent before children, children
//! in source order) starting at and including the given root. A missing match
//! is an ordinary `None` or empty result.

use crate::ts::kind::NodeKind;
use crate::ts::tree::SyntaxNode;

/// Find the first node of `kind` under `root`, optionally requiring its text
/// to equal `name` exactly.
pub fn find_node<'t>(
    root: SyntaxNode<'t>,
    kind: NodeKind,
    name: Option<&str>,
) -> Option<SyntaxNode<'t>> {
    root.descendants()
        .find(|node| node.kind() == kind && name.map_or(true, |name| node.text() == name))
}

/// Collect nodes of `kind` under `root` in encounter order, stopping after
/// `limit` matches when given.
pub fn find_nodes<'t>(
    root: SyntaxNode<'t>,
    kind: NodeKind,
    limit: Option<usize>,
) -> Vec<SyntaxNode<'t>> {
    let matches = root.descendants().filter(|node| node.kind() == kind);
    match limit {
        Some(limit) => matches.take(limit).collect(),
        None => matches.collect(),
    }
}

/// Nearest strict ancestor of `kind`.
pub fn ancestor_of_kind<'t>(node: SyntaxNode<'t>, kind: NodeKind) -> Option<SyntaxNode<'t>> {
    node.ancestors().find(|ancestor| ancestor.kind() == kind)
}

/// First immediate child of `kind`.
pub fn first_child_of_kind<'t>(node: SyntaxNode<'t>, kind: NodeKind) -> Option<SyntaxNode<'t>> {
    node.children().find(|child| child.kind() == kind)
}

/// Nearest ancestor that is a statement.
///
/// Stops at the first statement-level node, so an identifier nested inside a
/// declaration never resolves to an unrelated outer statement.
pub fn enclosing_statement(node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    node.ancestors().find(|ancestor| ancestor.kind().is_statement())
}

/// Find the first `kind` node named `name` whose parent has kind `parent`.
pub fn find_node_with_parent<'t>(
    root: SyntaxNode<'t>,
    kind: NodeKind,
    name: &str,
    parent: NodeKind,
) -> Option<SyntaxNode<'t>> {
    find_nodes(root, kind, None)
        .into_iter()
        .find(|node| node.text() == name && node.parent().is_some_and(|p| p.kind() == parent))
}
