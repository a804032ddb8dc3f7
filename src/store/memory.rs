use crate::safety::normalize_document_path;
use crate::store::{DocumentStore, StoreError};
use std::collections::BTreeMap;

/// In-memory document store keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, content)` pairs.
    pub fn with_documents<P, C>(documents: impl IntoIterator<Item = (P, C)>) -> Result<Self, StoreError>
    where
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut store = Self::new();
        for (path, content) in documents {
            store.create(path.as_ref(), content.into())?;
        }
        Ok(store)
    }

    /// Normalized paths of all documents, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl DocumentStore for MemoryStore {
    fn exists(&self, path: &str) -> bool {
        normalize_document_path(path)
            .map(|key| self.documents.contains_key(&key))
            .unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_document_path(path)?;
        Ok(self.documents.get(&key).cloned())
    }

    fn create(&mut self, path: &str, content: String) -> Result<(), StoreError> {
        let key = normalize_document_path(path)?;
        if self.documents.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.documents.insert(key, content);
        Ok(())
    }

    fn overwrite(&mut self, path: &str, content: String) -> Result<(), StoreError> {
        let key = normalize_document_path(path)?;
        match self.documents.get_mut(&key) {
            Some(existing) => {
                *existing = content;
                Ok(())
            }
            None => Err(StoreError::DocumentNotFound {
                path: path.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_existing_document() {
        let mut store = MemoryStore::with_documents([("/a.ts", "a")]).unwrap();
        let err = store.create("a.ts", "again".into()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.read("a.ts").unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn overwrite_requires_existing_document() {
        let mut store = MemoryStore::new();
        let err = store.overwrite("/missing.ts", "x".into()).unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound { .. }));
        assert!(!store.exists("missing.ts"));
    }

    #[test]
    fn read_absent_document_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read("nothing.json").unwrap(), None);
        assert!(matches!(
            store.read_to_string("nothing.json"),
            Err(StoreError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn leading_slash_names_the_same_document() {
        let store = MemoryStore::with_documents([("src/main.ts", "main")]).unwrap();
        assert!(store.exists("/src/main.ts"));
        assert_eq!(store.paths().collect::<Vec<_>>(), vec!["src/main.ts"]);
    }
}
