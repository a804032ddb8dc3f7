use crate::config::schema::{HmrConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the options file looked up in the workspace root.
pub const DEFAULT_CONFIG_FILE: &str = "hmr-patcher.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn at(self, file: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(file.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(file.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read options file {}: {source}", path.display())
            }
            ConfigError::Toml { path: Some(path), source } => {
                write!(f, "malformed options file {}: {source}", path.display())
            }
            ConfigError::Toml { path: None, source } => write!(f, "malformed options: {source}"),
            ConfigError::Validation { path: Some(path), source } => {
                write!(f, "invalid options in {}:\n{source}", path.display())
            }
            ConfigError::Validation { path: None, source } => {
                write!(f, "invalid options:\n{source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<HmrConfig, ConfigError> {
    let config: HmrConfig =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<HmrConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at(path))
}

/// Load `explicit` when given, else `<workspace>/hmr-patcher.toml` when it
/// exists, else the built-in defaults.
pub fn load_for_workspace(
    workspace: &Path,
    explicit: Option<&Path>,
) -> Result<HmrConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }
    let candidate = workspace.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        tracing::debug!(path = %candidate.display(), "loading options file");
        load_from_path(candidate)
    } else {
        Ok(HmrConfig::default())
    }
}
