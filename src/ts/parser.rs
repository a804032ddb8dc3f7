use crate::ts::errors::TreeSitterError;
use crate::ts::tree::SyntaxTree;
use ast_grep_language::{LanguageExt, SupportLang};
use std::path::Path;
use std::sync::Arc;
use tree_sitter::Parser;

/// Tree-sitter parser wrapper for TypeScript source code.
pub struct TypeScriptParser {
    parser: Parser,
}

impl TypeScriptParser {
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = SupportLang::TypeScript.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source text into an immutable [`SyntaxTree`].
    ///
    /// Malformed input still yields a tree; recovery nodes are reported by
    /// [`SyntaxTree::has_errors`].
    pub fn parse(&mut self, source: impl Into<Arc<str>>) -> Result<SyntaxTree, TreeSitterError> {
        let source = source.into();
        let tree = self
            .parser
            .parse(source.as_bytes(), None)
            .ok_or(TreeSitterError::ParseFailed)?;
        Ok(SyntaxTree::from_ts(source, &tree))
    }
}

/// Parse TypeScript text with a fresh parser.
///
/// Each call is independent: no parser state survives between calls.
pub fn parse(source: impl Into<Arc<str>>) -> Result<SyntaxTree, TreeSitterError> {
    TypeScriptParser::new()?.parse(source)
}

/// Parse a TypeScript file from disk.
pub fn parse_file(path: &Path) -> Result<SyntaxTree, TreeSitterError> {
    let source = std::fs::read_to_string(path).map_err(|e| TreeSitterError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(source)
}
