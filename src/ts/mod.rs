//! Tree-sitter integration for structural TypeScript queries.
//!
//! Source text is parsed once into an immutable arena [`SyntaxTree`]; queries
//! hand out borrowed [`SyntaxNode`] handles whose byte spans feed the edit set.

pub mod errors;
pub mod kind;
pub mod parser;
pub mod query;
pub mod tree;
pub mod validator;

pub use errors::TreeSitterError;
pub use kind::NodeKind;
pub use parser::{parse, parse_file, TypeScriptParser};
pub use query::{
    ancestor_of_kind, enclosing_statement, find_node, find_node_with_parent, find_nodes,
    first_child_of_kind,
};
pub use tree::{NodeId, Span, SyntaxNode, SyntaxTree};
pub use validator::{check_patched, SyntaxCheck};
