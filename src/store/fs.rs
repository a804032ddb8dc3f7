use crate::safety::{normalize_document_path, WorkspaceGuard};
use crate::store::{DocumentStore, StoreError};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct Staged {
    /// Content on disk when the document was first staged; `None` if created.
    original: Option<String>,
    content: String,
}

/// A pending change to one document, as seen by [`FsStore::changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange<'a> {
    pub path: &'a str,
    pub before: Option<&'a str>,
    pub after: &'a str,
}

/// Filesystem-backed document store rooted at a workspace.
///
/// Writes are staged in memory and read back by later operations, so a whole
/// run sees its own changes. Nothing touches the disk until [`FsStore::flush`].
#[derive(Debug)]
pub struct FsStore {
    guard: WorkspaceGuard,
    staged: BTreeMap<String, Staged>,
}

impl FsStore {
    pub fn open(workspace_root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self {
            guard: WorkspaceGuard::new(workspace_root)?,
            staged: BTreeMap::new(),
        })
    }

    pub fn workspace_root(&self) -> &Path {
        self.guard.workspace_root()
    }

    /// Staged documents whose content differs from disk, sorted by path.
    pub fn changes(&self) -> Vec<StagedChange<'_>> {
        self.staged
            .iter()
            .filter(|(_, staged)| staged.original.as_deref() != Some(staged.content.as_str()))
            .map(|(path, staged)| StagedChange {
                path: path.as_str(),
                before: staged.original.as_deref(),
                after: staged.content.as_str(),
            })
            .collect()
    }

    /// Persist every staged change and return the host paths written.
    ///
    /// Each file is written atomically (tempfile + fsync + rename) and its
    /// mtime bumped so running dev servers pick the change up. A document
    /// leaves the staging area only once it is on disk; after a failed write
    /// it and every document not yet reached stay staged.
    pub fn flush(&mut self) -> Result<Vec<PathBuf>, StoreError> {
        let mut written = Vec::new();
        let pending: Vec<String> = self.staged.keys().cloned().collect();

        for path in pending {
            let Some(staged) = self.staged.get(&path) else {
                continue;
            };
            if staged.original.as_deref() != Some(staged.content.as_str()) {
                written.push(self.write_document(&path, &staged.content)?);
            }
            self.staged.remove(&path);
        }

        Ok(written)
    }

    fn write_document(&self, key: &str, content: &str) -> Result<PathBuf, StoreError> {
        let target = self.guard.resolve(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        atomic_write(&target, content.as_bytes()).map_err(|source| StoreError::Io {
            path: target.clone(),
            source,
        })?;
        filetime::set_file_mtime(&target, filetime::FileTime::now()).map_err(|source| {
            StoreError::Io {
                path: target.clone(),
                source,
            }
        })?;
        tracing::info!(path = %target.display(), "wrote document");
        Ok(target)
    }

    fn read_disk(&self, key: &str) -> Result<Option<String>, StoreError> {
        let target = self.guard.resolve(key)?;
        match fs::read(&target) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Utf8 {
                    path: key.to_string(),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: target,
                source,
            }),
        }
    }
}

impl DocumentStore for FsStore {
    fn exists(&self, path: &str) -> bool {
        let Ok(key) = normalize_document_path(path) else {
            return false;
        };
        if self.staged.contains_key(&key) {
            return true;
        }
        self.guard
            .resolve(&key)
            .map(|target| target.is_file())
            .unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_document_path(path)?;
        if let Some(staged) = self.staged.get(&key) {
            return Ok(Some(staged.content.clone()));
        }
        self.read_disk(&key)
    }

    fn create(&mut self, path: &str, content: String) -> Result<(), StoreError> {
        let key = normalize_document_path(path)?;
        if self.exists(&key) {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.guard.resolve(&key)?;
        self.staged.insert(
            key,
            Staged {
                original: None,
                content,
            },
        );
        Ok(())
    }

    fn overwrite(&mut self, path: &str, content: String) -> Result<(), StoreError> {
        let key = normalize_document_path(path)?;
        if let Some(staged) = self.staged.get_mut(&key) {
            staged.content = content;
            return Ok(());
        }
        let original = self
            .read_disk(&key)?
            .ok_or_else(|| StoreError::DocumentNotFound {
                path: path.to_string(),
            })?;
        self.staged.insert(
            key,
            Staged {
                original: Some(original),
                content,
            },
        );
        Ok(())
    }
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no parent directory")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.ts"), "main();\n").unwrap();
        dir
    }

    #[test]
    fn writes_are_staged_until_flush() {
        let dir = workspace();
        let mut store = FsStore::open(dir.path()).unwrap();

        store.overwrite("/src/main.ts", "patched();\n".into()).unwrap();
        assert_eq!(store.read_to_string("src/main.ts").unwrap(), "patched();\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.ts")).unwrap(),
            "main();\n"
        );

        let written = store.flush().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.ts")).unwrap(),
            "patched();\n"
        );
        assert!(store.changes().is_empty());
    }

    #[test]
    fn created_documents_get_parent_directories() {
        let dir = workspace();
        let mut store = FsStore::open(dir.path()).unwrap();

        store
            .create("src/environments/environment.hmr.ts", "env".into())
            .unwrap();
        assert!(store.exists("src/environments/environment.hmr.ts"));
        assert!(matches!(
            store.create("src/environments/environment.hmr.ts", "again".into()),
            Err(StoreError::AlreadyExists { .. })
        ));

        store.flush().unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("src/environments/environment.hmr.ts")).unwrap(),
            "env"
        );
    }

    #[test]
    fn changes_report_before_and_after() {
        let dir = workspace();
        let mut store = FsStore::open(dir.path()).unwrap();

        store.overwrite("src/main.ts", "main();\n".into()).unwrap();
        assert!(store.changes().is_empty(), "unchanged content is not a change");

        store.overwrite("src/main.ts", "other();\n".into()).unwrap();
        store.create("src/hmr.ts", "hmr".into()).unwrap();

        let changes = store.changes();
        assert_eq!(
            changes,
            vec![
                StagedChange {
                    path: "src/hmr.ts",
                    before: None,
                    after: "hmr"
                },
                StagedChange {
                    path: "src/main.ts",
                    before: Some("main();\n"),
                    after: "other();\n"
                },
            ]
        );
    }

    #[test]
    fn failed_flush_keeps_unwritten_changes_staged() {
        let dir = workspace();
        fs::write(dir.path().join("src/z.ts"), "z;\n").unwrap();
        let mut store = FsStore::open(dir.path()).unwrap();

        store.create("src/a.ts", "a;\n".into()).unwrap();
        store.overwrite("src/z.ts", "patched;\n".into()).unwrap();
        fs::create_dir(dir.path().join("src/a.ts")).unwrap();

        assert!(matches!(store.flush(), Err(StoreError::Io { .. })));
        let paths: Vec<&str> = store.changes().iter().map(|c| c.path).collect();
        assert_eq!(paths, ["src/a.ts", "src/z.ts"]);
        assert_eq!(store.read_to_string("src/z.ts").unwrap(), "patched;\n");
        assert_eq!(fs::read_to_string(dir.path().join("src/z.ts")).unwrap(), "z;\n");

        fs::remove_dir(dir.path().join("src/a.ts")).unwrap();
        assert_eq!(store.flush().unwrap().len(), 2);
        assert!(store.changes().is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("src/a.ts")).unwrap(), "a;\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("src/z.ts")).unwrap(),
            "patched;\n"
        );
    }

    #[test]
    fn overwrite_of_missing_document_fails() {
        let dir = workspace();
        let mut store = FsStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.overwrite("angular.json", "{}".into()),
            Err(StoreError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn forbidden_directories_are_rejected() {
        let dir = workspace();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        let mut store = FsStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.create("node_modules/x.ts", "x".into()),
            Err(StoreError::Safety(_))
        ));
    }
}
