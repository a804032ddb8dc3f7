use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_PACKAGE: &str = "@angularclass/hmr";
pub const DEFAULT_SCRIPT: &str = "ng serve --configuration hmr";
pub const DEFAULT_KEY: &str = "hmr";

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct HmrConfig {
    #[serde(default)]
    pub meta: Metadata,
    /// Free-form values substituted into templates; nothing else reads them.
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
    #[serde(default)]
    pub install: Install,
    #[serde(default)]
    pub serve: Serve,
    #[serde(default = "default_environments")]
    pub environments: Vec<EnvironmentPatch>,
}

impl Default for HmrConfig {
    fn default() -> Self {
        Self {
            meta: Metadata::default(),
            options: BTreeMap::new(),
            install: Install::default(),
            serve: Serve::default(),
            environments: default_environments(),
        }
    }
}

impl HmrConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.install.package.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                entry: None,
                field: "install.package",
            });
        }
        if self.serve.script.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                entry: None,
                field: "serve.script",
            });
        }

        for (idx, env) in self.environments.iter().enumerate() {
            let entry = Some(format!("environments[{idx}]"));
            if env.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    entry: entry.clone(),
                    field: "file",
                });
            } else if !env.file.ends_with(".ts") {
                issues.push(ValidationIssue::InvalidCombo {
                    entry: entry.clone(),
                    message: format!("environment file '{}' is not a .ts file", env.file),
                });
            }
            if env.key.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    entry: entry.clone(),
                    field: "key",
                });
            } else if env
                .key
                .chars()
                .any(|c| matches!(c, '"' | '\'' | '\\' | '`') || c.is_control())
            {
                issues.push(ValidationIssue::InvalidCombo {
                    entry: entry.clone(),
                    message: format!("key '{}' contains quotes or control characters", env.key.escape_debug()),
                });
            }
            if self.environments[..idx]
                .iter()
                .any(|other| other.file == env.file && other.key == env.key)
            {
                issues.push(ValidationIssue::InvalidCombo {
                    entry,
                    message: format!("duplicate entry for '{}' key '{}'", env.file, env.key),
                });
            }
        }

        if let Some(range) = &self.meta.version_range {
            if semver::VersionReq::parse(range.trim()).is_err() && !range.trim().is_empty() {
                issues.push(ValidationIssue::InvalidCombo {
                    entry: None,
                    message: format!("meta.version_range '{range}' is not a semver requirement"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Options rendered as strings for template substitution.
    pub fn template_values(&self) -> BTreeMap<String, String> {
        self.options
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Required `@angular/core` version, e.g. `">=6.0.0"`.
    #[serde(default)]
    pub version_range: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Install {
    #[serde(default = "default_package")]
    pub package: String,
}

impl Default for Install {
    fn default() -> Self {
        Self {
            package: default_package(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Serve {
    #[serde(default = "default_script")]
    pub script: String,
}

impl Default for Serve {
    fn default() -> Self {
        Self {
            script: default_script(),
        }
    }
}

/// One key to add to the `environment` object of a file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentPatch {
    pub file: String,
    #[serde(default = "default_key")]
    pub key: String,
    pub value: EnvValue,
}

impl EnvironmentPatch {
    pub fn new(file: impl Into<String>, key: impl Into<String>, value: EnvValue) -> Self {
        Self {
            file: file.into(),
            key: key.into(),
            value,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Str(String),
}

impl EnvValue {
    /// TypeScript literal for the value.
    pub fn to_literal(&self) -> String {
        match self {
            EnvValue::Bool(value) => value.to_string(),
            EnvValue::Str(value) => string_literal(value),
        }
    }
}

/// Double-quoted TypeScript string literal.
pub fn string_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A scalar from the free-form `[options]` table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::Integer(v) => write!(f, "{v}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Str(v) => f.write_str(v),
        }
    }
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

fn default_script() -> String {
    DEFAULT_SCRIPT.to_string()
}

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

pub fn default_environments() -> Vec<EnvironmentPatch> {
    vec![
        EnvironmentPatch::new(
            "src/environments/environment.ts",
            DEFAULT_KEY,
            EnvValue::Bool(false),
        ),
        EnvironmentPatch::new(
            "src/environments/environment.prod.ts",
            DEFAULT_KEY,
            EnvValue::Bool(false),
        ),
        EnvironmentPatch::new(
            "src/environments/environment.hmr.ts",
            DEFAULT_KEY,
            EnvValue::Bool(true),
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        entry: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        entry: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { entry, field } => match entry {
                Some(entry) => write!(f, "{entry} missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { entry, message } => match entry {
                Some(entry) => write!(f, "{entry} has invalid configuration: {message}"),
                None => write!(f, "invalid configuration: {message}"),
            },
        }
    }
}
