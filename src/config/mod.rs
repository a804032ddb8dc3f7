pub mod loader;
pub mod schema;
pub mod version;

pub use loader::{load_for_workspace, load_from_path, load_from_str, ConfigError, DEFAULT_CONFIG_FILE};
pub use schema::{
    EnvValue, EnvironmentPatch, HmrConfig, Install, Metadata, OptionValue, Serve, ValidationError,
    ValidationIssue,
};
pub use version::{angular_core_version, matches_requirement, VersionError};
