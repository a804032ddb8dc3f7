use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstGrepError {
    #[error("pattern `{pattern}` matched {count} locations, expected exactly 1")]
    AmbiguousMatch { pattern: String, count: usize },

    #[error("pattern `{pattern}` matched 0 locations")]
    NoMatch { pattern: String },
}
