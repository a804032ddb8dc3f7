use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories under the workspace root that documents may never be written to.
const FORBIDDEN_DIRS: &[&str] = &["node_modules", ".git", "dist", ".angular"];

/// Workspace safety checks to prevent writing documents outside the target workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Absolute path to workspace root
    workspace_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Invalid document path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

/// Normalize a document path to its workspace-relative `a/b/c` form.
///
/// A leading `/` is accepted, so `/src/main.ts` and `src/main.ts` name the
/// same document. `.` components are dropped; `..` is rejected.
pub fn normalize_document_path(path: &str) -> Result<String, SafetyError> {
    let invalid = |reason| SafetyError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let mut parts = Vec::new();
    for component in Path::new(path.trim_start_matches(['/', '\\'])).components() {
        match component {
            Component::Normal(part) => {
                parts.push(part.to_str().ok_or_else(|| invalid("not valid UTF-8"))?)
            }
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("parent directory components are not allowed")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("absolute host paths are not allowed"))
            }
        }
    }

    if parts.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(parts.join("/"))
}

impl WorkspaceGuard {
    /// Create a new workspace guard with the given root.
    ///
    /// The workspace root will be canonicalized to handle symlinks correctly.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let workspace_root = workspace_root.as_ref().canonicalize()?;

        let forbidden_paths = FORBIDDEN_DIRS
            .iter()
            .filter_map(|dir| workspace_root.join(dir).canonicalize().ok())
            .collect();

        Ok(Self {
            workspace_root,
            forbidden_paths,
        })
    }

    /// Resolve a document path to a host path that is safe to write.
    ///
    /// The document may not exist yet: its nearest existing ancestor is
    /// canonicalized instead, which still catches symlinked directories that
    /// lead out of the workspace.
    pub fn resolve(&self, document: &str) -> Result<PathBuf, SafetyError> {
        let relative = normalize_document_path(document)?;
        let absolute = self.workspace_root.join(&relative);

        let mut existing = absolute.as_path();
        let mut suffix = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    suffix.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            }
        }

        let mut canonical = existing.canonicalize()?;
        for name in suffix.into_iter().rev() {
            canonical.push(name);
        }

        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Get the workspace root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn normalizes_leading_slash_and_dots() {
        assert_eq!(normalize_document_path("/src/main.ts").unwrap(), "src/main.ts");
        assert_eq!(normalize_document_path("src/./main.ts").unwrap(), "src/main.ts");
        assert_eq!(normalize_document_path("angular.json").unwrap(), "angular.json");
    }

    #[test]
    fn rejects_parent_components_and_empty_paths() {
        assert!(matches!(
            normalize_document_path("../secret.ts"),
            Err(SafetyError::InvalidPath { .. })
        ));
        assert!(matches!(
            normalize_document_path("src/../../x"),
            Err(SafetyError::InvalidPath { .. })
        ));
        assert!(matches!(
            normalize_document_path("/"),
            Err(SafetyError::InvalidPath { .. })
        ));
    }

    #[test]
    fn resolves_existing_and_new_documents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        fs::create_dir_all(workspace.join("src")).unwrap();
        fs::write(workspace.join("src/main.ts"), b"").unwrap();
        let guard = WorkspaceGuard::new(workspace).unwrap();

        let existing = guard.resolve("/src/main.ts").unwrap();
        assert!(existing.ends_with("src/main.ts"));

        let fresh = guard.resolve("src/environments/environment.hmr.ts").unwrap();
        assert!(fresh.starts_with(guard.workspace_root()));
        assert!(fresh.ends_with("src/environments/environment.hmr.ts"));
    }

    #[test]
    fn rejects_forbidden_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        fs::create_dir_all(workspace.join("node_modules/pkg")).unwrap();
        let guard = WorkspaceGuard::new(workspace).unwrap();

        let result = guard.resolve("node_modules/pkg/index.ts");
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path().join("workspace");
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(&workspace).unwrap();
        fs::create_dir_all(&outside).unwrap();
        symlink(&outside, workspace.join("src")).unwrap();

        let guard = WorkspaceGuard::new(&workspace).unwrap();
        let result = guard.resolve("src/main.ts");

        assert!(matches!(result, Err(SafetyError::OutsideWorkspace { .. })));
    }
}
