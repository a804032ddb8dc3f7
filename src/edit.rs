use crate::ts::SyntaxTree;
use std::sync::Arc;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Which side of an anchor offset an insertion attaches to.
///
/// At a shared offset every `Left` insertion renders before every `Right`
/// insertion, and both render before original content starting there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Left,
    Right,
}

/// A pending change against the original text of one document.
///
/// Offsets always refer to the original text, never to partially patched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert { at: usize, side: Side, text: String },
    Remove { from: usize, to: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("edit offset {offset} is outside text of length {len}")]
    OutOfBounds { offset: usize, len: usize },

    #[error("inverted removal range [{from}, {to})")]
    InvertedRange { from: usize, to: usize },

    #[error("edit offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("overlapping removals [{first_from}, {first_to}) and [{second_from}, {second_to})")]
    OverlappingRemoves {
        first_from: usize,
        first_to: usize,
        second_from: usize,
        second_to: usize,
    },

    #[error("insertion at {at} falls strictly inside removal [{from}, {to})")]
    InsertInsideRemoval { at: usize, from: usize, to: usize },
}

/// The batch of pending edits for one document, bound to one snapshot.
///
/// Created by [`DocumentStore::begin_update`](crate::store::DocumentStore::begin_update)
/// and consumed by [`DocumentStore::commit_update`](crate::store::DocumentStore::commit_update);
/// since commit takes the set by value it can never be committed twice.
#[derive(Debug)]
#[must_use = "EditSet does nothing until it is committed"]
pub struct EditSet {
    path: String,
    original: Arc<str>,
    fingerprint: u64,
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new(path: impl Into<String>, original: impl Into<Arc<str>>) -> Self {
        let original = original.into();
        Self {
            path: path.into(),
            fingerprint: xxh3_64(original.as_bytes()),
            original,
            edits: Vec::new(),
        }
    }

    /// Insert `text` at `at`, before same-offset `Right` insertions.
    pub fn insert_left(&mut self, at: usize, text: impl Into<String>) -> &mut Self {
        self.push_insert(at, Side::Left, text.into())
    }

    /// Insert `text` at `at`, after same-offset `Left` insertions and before
    /// original content starting at `at`.
    pub fn insert_right(&mut self, at: usize, text: impl Into<String>) -> &mut Self {
        self.push_insert(at, Side::Right, text.into())
    }

    /// Remove the original text in `[from, to)`.
    pub fn remove(&mut self, from: usize, to: usize) -> &mut Self {
        tracing::debug!(path = %self.path, from, to, "queued removal");
        self.edits.push(Edit::Remove { from, to });
        self
    }

    fn push_insert(&mut self, at: usize, side: Side, text: String) -> &mut Self {
        tracing::debug!(path = %self.path, at, ?side, len = text.len(), "queued insertion");
        self.edits.push(Edit::Insert { at, side, text });
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The snapshot text all offsets refer to.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// xxh3 hash of the snapshot, used to detect a document that changed
    /// between `begin_update` and `commit_update`.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Parse the snapshot. The tree shares the snapshot text with this set.
    pub fn parse(&self) -> Result<SyntaxTree, crate::ts::TreeSitterError> {
        crate::ts::parse(Arc::clone(&self.original))
    }

    /// Whether `tree` was parsed from this set's snapshot.
    pub fn is_snapshot_of(&self, tree: &SyntaxTree) -> bool {
        Arc::ptr_eq(&self.original, tree.shared_source()) || *self.original == *tree.source()
    }

    /// Replay the edits against the snapshot, consuming the set.
    pub fn commit(self) -> Result<String, EditError> {
        crate::commit::commit(&self.original, &self.edits)
    }

    pub(crate) fn into_parts(self) -> (String, u64, Arc<str>, Vec<Edit>) {
        (self.path, self.fingerprint, self.original, self.edits)
    }
}
