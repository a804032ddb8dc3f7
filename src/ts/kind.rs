use std::fmt;

/// Kind tag of a syntax node.
///
/// Named variants cover the TypeScript constructs the patcher navigates by;
/// every other grammar kind is carried through as [`NodeKind::Other`] with the
/// grammar's own kind string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    ImportStatement,
    ImportClause,
    NamedImports,
    ImportSpecifier,
    ExportStatement,
    LexicalDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    ExpressionStatement,
    IfStatement,
    ReturnStatement,
    StatementBlock,
    CallExpression,
    MemberExpression,
    ArrowFunction,
    Arguments,
    Object,
    Pair,
    Array,
    Identifier,
    PropertyIdentifier,
    String,
    Comment,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Semicolon,
    Error,
    Other(&'static str),
}

impl NodeKind {
    /// Map a tree-sitter TypeScript kind string to a node kind.
    pub fn from_ts(kind: &'static str) -> Self {
        match kind {
            "program" => NodeKind::Program,
            "import_statement" => NodeKind::ImportStatement,
            "import_clause" => NodeKind::ImportClause,
            "named_imports" => NodeKind::NamedImports,
            "import_specifier" => NodeKind::ImportSpecifier,
            "export_statement" => NodeKind::ExportStatement,
            "lexical_declaration" => NodeKind::LexicalDeclaration,
            "variable_declaration" => NodeKind::VariableDeclaration,
            "variable_declarator" => NodeKind::VariableDeclarator,
            "expression_statement" => NodeKind::ExpressionStatement,
            "if_statement" => NodeKind::IfStatement,
            "return_statement" => NodeKind::ReturnStatement,
            "statement_block" => NodeKind::StatementBlock,
            "call_expression" => NodeKind::CallExpression,
            "member_expression" => NodeKind::MemberExpression,
            "arrow_function" => NodeKind::ArrowFunction,
            "arguments" => NodeKind::Arguments,
            "object" => NodeKind::Object,
            "pair" => NodeKind::Pair,
            "array" => NodeKind::Array,
            "identifier" => NodeKind::Identifier,
            "property_identifier" => NodeKind::PropertyIdentifier,
            "string" => NodeKind::String,
            "comment" => NodeKind::Comment,
            "{" => NodeKind::OpenBrace,
            "}" => NodeKind::CloseBrace,
            "(" => NodeKind::OpenParen,
            ")" => NodeKind::CloseParen,
            "[" => NodeKind::OpenBracket,
            "]" => NodeKind::CloseBracket,
            "," => NodeKind::Comma,
            ";" => NodeKind::Semicolon,
            "ERROR" => NodeKind::Error,
            other => NodeKind::Other(other),
        }
    }

    /// Parse a kind name as typed on the command line.
    ///
    /// Accepts both the grammar spelling (`call_expression`) and the variant
    /// spelling (`CallExpression`); punctuation is accepted literally.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = to_snake_case(name);
        KNOWN
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized || kind.as_str() == name)
    }

    /// The grammar's kind string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Program => "program",
            NodeKind::ImportStatement => "import_statement",
            NodeKind::ImportClause => "import_clause",
            NodeKind::NamedImports => "named_imports",
            NodeKind::ImportSpecifier => "import_specifier",
            NodeKind::ExportStatement => "export_statement",
            NodeKind::LexicalDeclaration => "lexical_declaration",
            NodeKind::VariableDeclaration => "variable_declaration",
            NodeKind::VariableDeclarator => "variable_declarator",
            NodeKind::ExpressionStatement => "expression_statement",
            NodeKind::IfStatement => "if_statement",
            NodeKind::ReturnStatement => "return_statement",
            NodeKind::StatementBlock => "statement_block",
            NodeKind::CallExpression => "call_expression",
            NodeKind::MemberExpression => "member_expression",
            NodeKind::ArrowFunction => "arrow_function",
            NodeKind::Arguments => "arguments",
            NodeKind::Object => "object",
            NodeKind::Pair => "pair",
            NodeKind::Array => "array",
            NodeKind::Identifier => "identifier",
            NodeKind::PropertyIdentifier => "property_identifier",
            NodeKind::String => "string",
            NodeKind::Comment => "comment",
            NodeKind::OpenBrace => "{",
            NodeKind::CloseBrace => "}",
            NodeKind::OpenParen => "(",
            NodeKind::CloseParen => ")",
            NodeKind::OpenBracket => "[",
            NodeKind::CloseBracket => "]",
            NodeKind::Comma => ",",
            NodeKind::Semicolon => ";",
            NodeKind::Error => "ERROR",
            NodeKind::Other(kind) => kind,
        }
    }

    /// Statement-level kinds, the boundary `enclosing_statement` stops at.
    pub fn is_statement(&self) -> bool {
        match self {
            NodeKind::ImportStatement
            | NodeKind::ExportStatement
            | NodeKind::LexicalDeclaration
            | NodeKind::VariableDeclaration
            | NodeKind::ExpressionStatement
            | NodeKind::IfStatement
            | NodeKind::ReturnStatement => true,
            NodeKind::Other(kind) => kind.ends_with("_statement") || kind.ends_with("_declaration"),
            _ => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const KNOWN: &[NodeKind] = &[
    NodeKind::Program,
    NodeKind::ImportStatement,
    NodeKind::ImportClause,
    NodeKind::NamedImports,
    NodeKind::ImportSpecifier,
    NodeKind::ExportStatement,
    NodeKind::LexicalDeclaration,
    NodeKind::VariableDeclaration,
    NodeKind::VariableDeclarator,
    NodeKind::ExpressionStatement,
    NodeKind::IfStatement,
    NodeKind::ReturnStatement,
    NodeKind::StatementBlock,
    NodeKind::CallExpression,
    NodeKind::MemberExpression,
    NodeKind::ArrowFunction,
    NodeKind::Arguments,
    NodeKind::Object,
    NodeKind::Pair,
    NodeKind::Array,
    NodeKind::Identifier,
    NodeKind::PropertyIdentifier,
    NodeKind::String,
    NodeKind::Comment,
    NodeKind::OpenBrace,
    NodeKind::CloseBrace,
    NodeKind::OpenParen,
    NodeKind::CloseParen,
    NodeKind::OpenBracket,
    NodeKind::CloseBracket,
    NodeKind::Comma,
    NodeKind::Semicolon,
    NodeKind::Error,
];

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_kinds_round_trip_through_names() {
        for kind in KNOWN {
            assert_eq!(NodeKind::from_ts(kind.as_str()), *kind);
        }
    }

    #[test]
    fn unknown_grammar_kind_is_preserved() {
        let kind = NodeKind::from_ts("template_string");
        assert_eq!(kind, NodeKind::Other("template_string"));
        assert_eq!(kind.as_str(), "template_string");
    }

    #[test]
    fn cli_names_accept_both_spellings() {
        assert_eq!(
            NodeKind::from_name("CallExpression"),
            Some(NodeKind::CallExpression)
        );
        assert_eq!(
            NodeKind::from_name("call_expression"),
            Some(NodeKind::CallExpression)
        );
        assert_eq!(NodeKind::from_name("{"), Some(NodeKind::OpenBrace));
        assert_eq!(NodeKind::from_name("NotAKind"), None);
    }

    #[test]
    fn statement_classification() {
        assert!(NodeKind::ExpressionStatement.is_statement());
        assert!(NodeKind::Other("for_statement").is_statement());
        assert!(!NodeKind::CallExpression.is_statement());
    }
}
