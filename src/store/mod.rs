//! Document stores: where patched text is read from and written back to.
//!
//! The core only needs the [`DocumentStore`] surface. [`MemoryStore`] keeps
//! everything in memory; [`FsStore`] stages writes over a workspace directory
//! and persists them atomically on [`FsStore::flush`].

mod fs;
mod memory;

pub use fs::{FsStore, StagedChange};
pub use memory::MemoryStore;

use crate::edit::{EditError, EditSet};
use crate::safety::SafetyError;
use std::path::PathBuf;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found: {path}")]
    DocumentNotFound { path: String },

    #[error("document already exists: {path}")]
    AlreadyExists { path: String },

    #[error("document {path} changed since its update began")]
    StaleSnapshot { path: String },

    #[error("invalid edit set for {path}: {source}")]
    Edit {
        path: String,
        #[source]
        source: EditError,
    },

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {path} is not valid UTF-8")]
    Utf8 { path: String },
}

/// A path-addressed collection of UTF-8 text documents.
///
/// Paths are workspace-relative; implementations normalize them with
/// [`normalize_document_path`](crate::safety::normalize_document_path).
pub trait DocumentStore {
    fn exists(&self, path: &str) -> bool;

    /// Current content, or `None` when the document does not exist.
    fn read(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Add a new document; fails when `path` already exists.
    fn create(&mut self, path: &str, content: String) -> Result<(), StoreError>;

    /// Replace an existing document; fails when `path` is absent.
    fn overwrite(&mut self, path: &str, content: String) -> Result<(), StoreError>;

    /// Current content; absence is [`StoreError::DocumentNotFound`].
    fn read_to_string(&self, path: &str) -> Result<String, StoreError> {
        self.read(path)?.ok_or_else(|| StoreError::DocumentNotFound {
            path: path.to_string(),
        })
    }

    /// Snapshot the document and bind a fresh edit set to it.
    fn begin_update(&self, path: &str) -> Result<EditSet, StoreError> {
        let content = self.read_to_string(path)?;
        Ok(EditSet::new(path, content))
    }

    /// Replay `edits` against their snapshot and write the result back.
    ///
    /// Rejects the set when the document changed after `begin_update`.
    /// An empty set leaves the document untouched.
    fn commit_update(&mut self, edits: EditSet) -> Result<(), StoreError> {
        if edits.is_empty() {
            return Ok(());
        }

        let current = self.read_to_string(edits.path())?;
        if xxh3_64(current.as_bytes()) != edits.fingerprint() {
            return Err(StoreError::StaleSnapshot {
                path: edits.path().to_string(),
            });
        }

        let (path, _, original, edits) = edits.into_parts();
        let patched = crate::commit::commit(&original, &edits).map_err(|source| StoreError::Edit {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(%path, edits = edits.len(), "committed update");
        self.overwrite(&path, patched)
    }
}
