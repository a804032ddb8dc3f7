//! Logging setup for the binary.
//!
//! Filter priority:
//!
//! 1. `HMR_PATCHER_LOG`: a bare level (`debug`) applies to this crate only,
//!    anything with `=`, `:` or `,` is used as a full filter.
//! 2. `RUST_LOG`, used as is.
//! 3. `warn,hmr_patcher=info`, or `warn,hmr_patcher=debug` with `-v`.
//!
//! Output goes to stderr so stdout stays for results and diffs.

use std::env;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "HMR_PATCHER_LOG";

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let filter = filter_from(env::var(LOG_ENV).ok(), env::var("RUST_LOG").ok(), verbose);
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter_from(crate_log: Option<String>, rust_log: Option<String>, verbose: bool) -> EnvFilter {
    EnvFilter::new(directives(crate_log, rust_log, verbose))
}

fn directives(crate_log: Option<String>, rust_log: Option<String>, verbose: bool) -> String {
    if let Some(level) = crate_log.filter(|value| !value.trim().is_empty()) {
        if level.contains(['=', ':', ',']) {
            return level;
        }
        return format!("warn,hmr_patcher={}", level.trim());
    }
    if let Some(rust_log) = rust_log.filter(|value| !value.trim().is_empty()) {
        return rust_log;
    }
    if verbose {
        "warn,hmr_patcher=debug".to_string()
    } else {
        "warn,hmr_patcher=info".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_variable_wins() {
        assert_eq!(
            directives(Some("trace".into()), Some("error".into()), false),
            "warn,hmr_patcher=trace"
        );
        assert_eq!(
            directives(Some("hmr_patcher::store=debug".into()), None, false),
            "hmr_patcher::store=debug"
        );
    }

    #[test]
    fn rust_log_is_used_verbatim() {
        assert_eq!(directives(None, Some("info".into()), true), "info");
    }

    #[test]
    fn verbose_flag_only_moves_the_default() {
        assert_eq!(directives(None, None, false), "warn,hmr_patcher=info");
        assert_eq!(directives(None, Some(" ".into()), true), "warn,hmr_patcher=debug");
    }
}
