//! ast-grep pattern matching over TypeScript sources.
//!
//! Patterns use ast-grep's metavariable syntax (`$NAME`, `$$$ARGS`); the HMR
//! steps use them for idempotency checks that would be awkward to spell as
//! node-kind queries.

pub mod errors;
pub mod lang;
pub mod matcher;

pub use errors::AstGrepError;
pub use lang::{typescript, SupportLang};
pub use matcher::{PatternMatch, PatternMatcher};
