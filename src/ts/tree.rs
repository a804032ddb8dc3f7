use crate::ts::kind::NodeKind;
use std::fmt;
use std::sync::Arc;

/// Half-open byte range `[pos, end)` into the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub pos: usize,
    pub end: usize,
}

impl Span {
    pub fn new(pos: usize, end: usize) -> Self {
        debug_assert!(pos <= end, "span start {pos} after end {end}");
        Self { pos, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.pos <= other.pos && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.pos, self.end)
    }
}

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    missing: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// One past the last descendant; nodes are stored in pre-order so a
    /// subtree occupies the contiguous range `[self, subtree_end)`.
    subtree_end: NodeId,
}

/// An immutable syntax tree together with the text it was parsed from.
///
/// The tree is never kept in sync with patched text: edits computed from it
/// always refer to offsets of [`SyntaxTree::source`].
#[derive(Clone)]
pub struct SyntaxTree {
    source: Arc<str>,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Build the arena from a tree-sitter tree by a single pre-order walk.
    pub(crate) fn from_ts(source: Arc<str>, tree: &tree_sitter::Tree) -> Self {
        let mut nodes: Vec<NodeData> = Vec::new();
        let mut ancestors: Vec<NodeId> = Vec::new();
        let mut cursor = tree.walk();

        loop {
            let node = cursor.node();
            let id = NodeId(nodes.len() as u32);
            let parent = ancestors.last().copied();
            nodes.push(NodeData {
                kind: NodeKind::from_ts(node.kind()),
                span: Span::new(node.start_byte(), node.end_byte()),
                missing: node.is_missing(),
                parent,
                children: Vec::new(),
                subtree_end: NodeId(id.0 + 1),
            });
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }

            if cursor.goto_first_child() {
                ancestors.push(id);
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Self { source, nodes };
                }
                if let Some(finished) = ancestors.pop() {
                    nodes[finished.index()].subtree_end = NodeId(nodes.len() as u32);
                }
            }
        }
    }

    /// The original text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn shared_source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id }
    }

    /// Number of nodes, named and anonymous.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = SyntaxNode<'_>> + '_ {
        (0..self.nodes.len() as u32).map(move |i| self.node(NodeId(i)))
    }

    /// Whether the parser had to recover from malformed input.
    pub fn has_errors(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| n.kind == NodeKind::Error || n.missing)
    }

    /// Spans of `ERROR` and missing nodes, in pre-order.
    pub fn error_spans(&self) -> Vec<Span> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Error || n.missing)
            .map(|n| n.span)
            .collect()
    }

    /// Flattened `(depth, kind, span)` sequence; equal for equal input text.
    pub fn shape(&self) -> Vec<(usize, NodeKind, Span)> {
        self.nodes()
            .map(|n| (n.depth(), n.kind(), n.span()))
            .collect()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("len", &self.nodes.len())
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// Borrowed handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.tree.data(self.id).kind
    }

    pub fn span(&self) -> Span {
        self.tree.data(self.id).span
    }

    pub fn pos(&self) -> usize {
        self.span().pos
    }

    pub fn end(&self) -> usize {
        self.span().end
    }

    /// Zero-width node inserted by error recovery.
    pub fn is_missing(&self) -> bool {
        self.tree.data(self.id).missing
    }

    /// The node's rendered text.
    pub fn text(&self) -> &'t str {
        let span = self.span();
        &self.tree.source[span.pos..span.end]
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.tree.data(self.id).parent.map(|id| self.tree.node(id))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + ExactSizeIterator + 't {
        let tree = self.tree;
        tree.data(self.id).children.iter().map(move |&id| tree.node(id))
    }

    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node followed by all of its descendants, in pre-order.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let tree = self.tree;
        let end = tree.data(self.id).subtree_end.0;
        (self.id.0..end).map(move |i| tree.node(NodeId(i)))
    }

    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind(), self.span())
    }
}
