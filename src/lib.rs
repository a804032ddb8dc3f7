//! HMR Patcher: structural patching of Angular workspaces for hot module
//! replacement.
//!
//! # Architecture
//!
//! TypeScript documents are parsed once into an immutable [`SyntaxTree`].
//! Queries over that tree yield byte offsets, which are recorded as
//! insertions and removals in an [`EditSet`]. Committing replays the whole
//! set against the original text in a single pass: the tree is never mutated
//! and nothing is re-parsed between edits.
//!
//! Insertions sharing an offset render `Left` before `Right` before the
//! original text at that offset, each side in recording order. An insertion
//! at the edge of a removal still renders, so "remove a statement, insert its
//! replacement at the same offset" works as one edit set.
//!
//! # Safety
//!
//! - Edit sets bind to a snapshot; committing after the document changed fails
//! - Overlapping removals and insertions inside removals are rejected
//! - Atomic file writes (tempfile + fsync + rename)
//! - Workspace boundary enforcement
//! - Idempotent steps
//!
//! # Example
//!
//! ```
//! use hmr_patcher::store::{DocumentStore, MemoryStore};
//! use hmr_patcher::ts::NodeKind;
//!
//! let mut store = MemoryStore::with_documents([(
//!     "src/environments/environment.ts",
//!     "export const environment = {\n  production: false\n};\n",
//! )])?;
//!
//! let mut edits = store.begin_update("src/environments/environment.ts")?;
//! let tree = edits.parse()?;
//! hmr_patcher::policy::insert_after_delimiter(
//!     &mut edits,
//!     &tree,
//!     NodeKind::Identifier,
//!     "environment",
//!     NodeKind::OpenBrace,
//!     "\n  hmr: true,",
//! );
//! store.commit_update(edits)?;
//!
//! assert_eq!(
//!     store.read_to_string("src/environments/environment.ts")?,
//!     "export const environment = {\n  hmr: true,\n  production: false\n};\n"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod commit;
pub mod config;
pub mod edit;
pub mod hmr;
pub mod logging;
pub mod policy;
pub mod safety;
pub mod sg;
pub mod store;
pub mod ts;

// Re-exports
pub use commit::commit;
pub use config::{load_for_workspace, load_from_path, load_from_str, ConfigError, HmrConfig};
pub use edit::{Edit, EditError, EditSet, Side};
pub use hmr::{Context, Report, Schematic, StepError, StepResult, Task};
pub use policy::{insert_after_delimiter, Placement};
pub use safety::{SafetyError, WorkspaceGuard};
pub use store::{DocumentStore, FsStore, MemoryStore, StoreError};
pub use ts::{find_node, find_nodes, parse, NodeKind, SyntaxNode, SyntaxTree, TreeSitterError};
