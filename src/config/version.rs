//! Angular version gating.
//!
//! `meta.version_range` is a semver requirement such as `">=6.0.0, <9"`;
//! the workspace version is read from the `@angular/core` entry of
//! `package.json`.

use semver::{Version, VersionReq};
use std::fmt;

#[derive(Debug, Clone)]
pub enum VersionError {
    InvalidVersion { value: String, source: String },
    InvalidRequirement { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{value}': {source}")
            }
            VersionError::InvalidRequirement { value, source } => {
                write!(f, "invalid version requirement '{value}': {source}")
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Check `version` against an optional requirement.
///
/// ```
/// use hmr_patcher::config::version::matches_requirement;
///
/// assert!(matches_requirement("6.1.0", Some(">=6.0.0")).unwrap());
/// assert!(!matches_requirement("5.2.9", Some(">=6.0.0")).unwrap());
/// assert!(matches_requirement("5.2.9", None).unwrap());
/// ```
pub fn matches_requirement(version: &str, requirement: Option<&str>) -> Result<bool, VersionError> {
    let Some(req) = requirement.map(str::trim).filter(|req| !req.is_empty()) else {
        return Ok(true);
    };

    let version = Version::parse(version).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;
    let req = VersionReq::parse(req).map_err(|e| VersionError::InvalidRequirement {
        value: req.to_string(),
        source: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

/// The `@angular/core` version declared in a `package.json` document.
///
/// Range operators are stripped (`"^6.0.0"` gives `6.0.0`) and partial
/// versions are padded (`"~7.1"` gives `7.1.0`). Returns `None` when the
/// dependency is absent or not a plain version.
pub fn angular_core_version(package_json: &serde_json::Value) -> Option<String> {
    let declared = ["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .find_map(|section| package_json.get(section)?.get("@angular/core")?.as_str())?;

    let bare = declared.trim().trim_start_matches(['^', '~', '>', '=', 'v', ' ']);
    let (core, pre) = match bare.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (bare, None),
    };

    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.parse::<u64>().is_err()) {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    let version = match pre {
        Some(pre) => format!("{}-{pre}", parts.join(".")),
        None => parts.join("."),
    };
    Version::parse(&version).ok().map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_or_blank_requirement_matches_everything() {
        assert!(matches_requirement("0.1.0", None).unwrap());
        assert!(matches_requirement("6.0.0", Some("  ")).unwrap());
    }

    #[test]
    fn ranges_gate_major_versions() {
        let req = Some(">=6.0.0, <9.0.0");
        assert!(matches_requirement("6.0.0", req).unwrap());
        assert!(matches_requirement("8.2.14", req).unwrap());
        assert!(!matches_requirement("5.2.11", req).unwrap());
        assert!(!matches_requirement("9.0.0", req).unwrap());
    }

    #[test]
    fn prerelease_only_matches_opted_in_requirements() {
        assert!(!matches_requirement("7.0.0-rc.1", Some(">=6.0.0")).unwrap());
        assert!(matches_requirement("7.0.0-rc.1", Some(">=7.0.0-rc.0")).unwrap());
    }

    #[test]
    fn malformed_inputs_are_reported() {
        assert!(matches!(
            matches_requirement("six", Some(">=6.0.0")),
            Err(VersionError::InvalidVersion { .. })
        ));
        assert!(matches!(
            matches_requirement("6.0.0", Some(">=six")),
            Err(VersionError::InvalidRequirement { .. })
        ));
    }

    #[test]
    fn core_version_is_read_from_dependency_ranges() {
        let pkg = json!({ "dependencies": { "@angular/core": "^6.0.3" } });
        assert_eq!(angular_core_version(&pkg).as_deref(), Some("6.0.3"));

        let pkg = json!({ "devDependencies": { "@angular/core": "~7.1" } });
        assert_eq!(angular_core_version(&pkg).as_deref(), Some("7.1.0"));

        let pkg = json!({ "dependencies": { "@angular/core": "8.0.0-beta.2" } });
        assert_eq!(angular_core_version(&pkg).as_deref(), Some("8.0.0-beta.2"));
    }

    #[test]
    fn non_version_specifiers_are_ignored() {
        for declared in ["latest", "github:angular/core-builds", "*"] {
            let pkg = json!({ "dependencies": { "@angular/core": declared } });
            assert_eq!(angular_core_version(&pkg), None, "{declared}");
        }
        assert_eq!(angular_core_version(&json!({})), None);
    }
}
