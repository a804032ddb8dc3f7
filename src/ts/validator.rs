use crate::ts::errors::TreeSitterError;
use crate::ts::parser::parse;
use crate::ts::tree::Span;

/// Outcome of re-parsing patched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Clean,
    /// Recovery nodes found in the patched text that the original did not have.
    Introduced(Vec<Span>),
}

/// Compare recovery nodes before and after a patch.
///
/// Returns [`SyntaxCheck::Clean`] when the patched text has no error nodes
/// beyond those already present in `original` (comparing by span is
/// imperfect after offsets shift, so only the count is used when the
/// original was already broken).
pub fn check_patched(original: &str, patched: &str) -> Result<SyntaxCheck, TreeSitterError> {
    let before = parse(original)?.error_spans();
    let after = parse(patched)?.error_spans();

    if after.len() <= before.len() {
        return Ok(SyntaxCheck::Clean);
    }
    if before.is_empty() {
        return Ok(SyntaxCheck::Introduced(after));
    }
    let introduced = after
        .into_iter()
        .filter(|span| !before.contains(span))
        .collect();
    Ok(SyntaxCheck::Introduced(introduced))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_patch_is_clean() {
        let original = "export const environment = {\n  production: false\n};\n";
        let patched = "export const environment = {\n  hmr: false,\n  production: false\n};\n";
        assert_eq!(check_patched(original, patched).unwrap(), SyntaxCheck::Clean);
    }

    #[test]
    fn broken_patch_is_reported() {
        let original = "const a = 1;\n";
        let patched = "const a = ;\n";
        assert!(matches!(
            check_patched(original, patched).unwrap(),
            SyntaxCheck::Introduced(spans) if !spans.is_empty()
        ));
    }

    #[test]
    fn already_broken_source_without_new_errors_is_clean() {
        let original = "const a = 1;\nconst b = {;\n";
        let patched = "const z = 0;\nconst a = 1;\nconst b = {;\n";
        assert_eq!(check_patched(original, patched).unwrap(), SyntaxCheck::Clean);
    }
}
