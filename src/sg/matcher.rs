use crate::sg::errors::AstGrepError;
use crate::sg::lang::typescript;
use crate::ts::Span;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch, Pattern};
use ast_grep_language::SupportLang;
use std::collections::HashMap;

/// One pattern match with its captured metavariables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub span: Span,
    pub text: String,
    /// Metavariable name to matched text.
    pub captures: HashMap<String, String>,
}

/// Matches ast-grep patterns against one TypeScript source.
///
/// ```text
/// hmrBootstrap($$$ARGS)                       // any hmrBootstrap call
/// import { $$$NAMES } from './hmr'            // named import from ./hmr
/// platformBrowserDynamic().bootstrapModule($M) // the stock bootstrap
/// ```
pub struct PatternMatcher {
    source: String,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            sg: AstGrep::new(source, typescript()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// All matches in pre-order.
    pub fn find_all(&self, pattern: &str) -> Vec<PatternMatch> {
        let pattern = Pattern::new(pattern, typescript());
        self.sg
            .root()
            .find_all(&pattern)
            .map(|m| self.to_match(m))
            .collect()
    }

    /// Exactly one match, or an error naming how many there were.
    pub fn find_unique(&self, pattern: &str) -> Result<PatternMatch, AstGrepError> {
        let mut matches = self.find_all(pattern);
        match matches.len() {
            0 => Err(AstGrepError::NoMatch {
                pattern: pattern.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(AstGrepError::AmbiguousMatch {
                pattern: pattern.to_string(),
                count,
            }),
        }
    }

    pub fn has_match(&self, pattern: &str) -> bool {
        let pattern = Pattern::new(pattern, typescript());
        self.sg.root().find(&pattern).is_some()
    }

    fn to_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let range = m.get_node().range();
        let captures: HashMap<String, String> = m.get_env().clone().into();
        PatternMatch {
            span: Span::new(range.start, range.end),
            text: self.source[range.start..range.end].to_string(),
            captures,
        }
    }
}
