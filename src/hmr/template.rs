use super::{StepError, StepOutcome, StepResult};
use crate::store::DocumentStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// `src/hmr.ts`, shipped with the binary.
pub const HMR_TS_TEMPLATE: &str = include_str!("../../templates/src/hmr.ts");

/// Suffix stripped from template file names (`main.ts.template` -> `main.ts`).
const TEMPLATE_SUFFIX: &str = ".template";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Embedded,
    /// Every file under the directory, keyed by its relative path.
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Workspace-relative destination.
    pub path: String,
    pub content: String,
}

impl TemplateSource {
    /// Template files in path order.
    pub fn load(&self) -> Result<Vec<TemplateFile>, StepError> {
        let root = match self {
            TemplateSource::Embedded => {
                return Ok(vec![TemplateFile {
                    path: "src/hmr.ts".to_string(),
                    content: HMR_TS_TEMPLATE.to_string(),
                }])
            }
            TemplateSource::Directory(root) => root,
        };

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = destination(root, entry.path())?;
            let content = fs::read_to_string(entry.path()).map_err(|source| StepError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            files.push(TemplateFile { path, content });
        }
        tracing::debug!(root = %root.display(), count = files.len(), "loaded templates");
        Ok(files)
    }
}

impl TemplateFile {
    /// Render and create the file; an existing file is left alone.
    pub fn create_in<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        values: &BTreeMap<String, String>,
    ) -> StepOutcome {
        if store.exists(&self.path) {
            return Ok(StepResult::AlreadyApplied {
                path: self.path.clone(),
            });
        }
        let rendered = render(&self.content, values).map_err(|message| StepError::Template {
            path: self.path.clone(),
            message,
        })?;
        store.create(&self.path, rendered)?;
        Ok(StepResult::Applied {
            path: self.path.clone(),
        })
    }
}

/// Substitute `<%= key %>` tags from `values`.
///
/// An unknown key or an unterminated tag is an error rather than an empty
/// substitution.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("<%=") {
        out.push_str(&rest[..open]);
        let tag = &rest[open + 3..];
        let close = tag
            .find("%>")
            .ok_or_else(|| "unterminated `<%=` tag".to_string())?;
        let key = tag[..close].trim();
        let value = values
            .get(key)
            .ok_or_else(|| format!("no option named `{key}`"))?;
        out.push_str(value);
        rest = &tag[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn destination(root: &Path, file: &Path) -> Result<String, StepError> {
    let relative = file.strip_prefix(root).map_err(|_| StepError::Template {
        path: file.display().to_string(),
        message: "outside the template directory".to_string(),
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => {
                return Err(StepError::Template {
                    path: relative.display().to_string(),
                    message: "unsupported path component".to_string(),
                })
            }
        }
    }

    let joined = parts.join("/");
    Ok(joined
        .strip_suffix(TEMPLATE_SUFFIX)
        .map(str::to_owned)
        .unwrap_or(joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn tags_are_substituted() {
        let out = render(
            "// <%= name %> (<%=index%>)\n",
            &values(&[("name", "shop"), ("index", "src/index.html")]),
        )
        .unwrap();
        assert_eq!(out, "// shop (src/index.html)\n");
    }

    #[test]
    fn unknown_and_unterminated_tags_fail() {
        assert!(render("<%= name %>", &values(&[])).unwrap_err().contains("name"));
        assert!(render("<%= name", &values(&[("name", "x")])).is_err());
    }

    #[test]
    fn text_without_tags_is_unchanged() {
        assert_eq!(
            render(HMR_TS_TEMPLATE, &values(&[])).unwrap(),
            HMR_TS_TEMPLATE
        );
    }

    #[test]
    fn embedded_template_is_created_once() {
        let mut store = MemoryStore::new();
        let files = TemplateSource::Embedded.load().unwrap();
        assert_eq!(files.len(), 1);

        let file = &files[0];
        assert!(matches!(
            file.create_in(&mut store, &values(&[])),
            Ok(StepResult::Applied { .. })
        ));
        assert!(store.read_to_string("src/hmr.ts").unwrap().contains("export const hmrBootstrap"));
        assert!(matches!(
            file.create_in(&mut store, &values(&[])),
            Ok(StepResult::AlreadyApplied { .. })
        ));
    }

    #[test]
    fn directory_templates_keep_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/app")).unwrap();
        fs::write(dir.path().join("src/hmr.ts"), "hmr").unwrap();
        fs::write(dir.path().join("src/app/banner.ts.template"), "<%= name %>").unwrap();

        let files = TemplateSource::Directory(dir.path().to_path_buf()).load().unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["src/app/banner.ts", "src/hmr.ts"]);

        let mut store = MemoryStore::new();
        files[0].create_in(&mut store, &values(&[("name", "shop")])).unwrap();
        assert_eq!(store.read_to_string("src/app/banner.ts").unwrap(), "shop");
    }
}
