//! Environment variable names used by this crate for convenient
//! configuration of handlers from microservices.
//!
//! These are purely helpers; the core handler types remain decoupled
//! from environment access.

use crate::handler::HandlerOptions;
use crate::level::Level;

/// Minimum level a record must reach to be emitted, e.g. `debug`,
/// `info`, `warn+2`, `error`.
pub const LOG_LEVEL_ENV: &str = "GCLOG_LEVEL";

/// Whether to attach source location metadata to entries.
pub const SOURCE_LOCATION_ENV: &str = "GCLOG_SOURCE_LOCATION";

/// Whether to attach trace correlation fields to entries.
pub const TRACE_INFO_ENV: &str = "GCLOG_TRACE_INFO";

/// Google Cloud project id used to qualify trace names.
pub const PROJECT_ID_ENV: &str = "GCLOG_PROJECT_ID";

/// Fallback project id variable, set by most Google Cloud runtimes.
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Build [`HandlerOptions`] from the process environment.
///
/// Unset or unparseable variables keep their defaults; the project id
/// falls back from [`PROJECT_ID_ENV`] to [`GOOGLE_CLOUD_PROJECT_ENV`].
pub fn options_from_env() -> HandlerOptions {
    options_from(|key| std::env::var(key).ok())
}

fn options_from(lookup: impl Fn(&str) -> Option<String>) -> HandlerOptions {
    let defaults = HandlerOptions::default();
    let level = lookup(LOG_LEVEL_ENV)
        .and_then(|raw| raw.parse::<Level>().ok())
        .unwrap_or(defaults.level);
    let add_source_location = lookup(SOURCE_LOCATION_ENV)
        .and_then(|raw| parse_bool(&raw))
        .unwrap_or(defaults.add_source_location);
    let add_trace_info = lookup(TRACE_INFO_ENV)
        .and_then(|raw| parse_bool(&raw))
        .unwrap_or(defaults.add_trace_info);
    let project_id = lookup(PROJECT_ID_ENV)
        .or_else(|| lookup(GOOGLE_CLOUD_PROJECT_ENV))
        .unwrap_or(defaults.project_id);
    HandlerOptions {
        level,
        add_source_location,
        add_trace_info,
        project_id,
    }
}

/// `None` for spellings outside the recognized sets, so callers keep
/// their default instead of misreading a typo as `false`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_yields_defaults() {
        let options = options_from(|_| None);
        let defaults = HandlerOptions::default();
        assert_eq!(options.level, defaults.level);
        assert_eq!(options.add_source_location, defaults.add_source_location);
        assert_eq!(options.add_trace_info, defaults.add_trace_info);
        assert_eq!(options.project_id, defaults.project_id);
    }

    #[test]
    fn variables_override_each_default() {
        let options = options_from(|key| match key {
            LOG_LEVEL_ENV => Some("debug".to_string()),
            SOURCE_LOCATION_ENV => Some("true".to_string()),
            TRACE_INFO_ENV => Some("0".to_string()),
            PROJECT_ID_ENV => Some("prod-project".to_string()),
            _ => None,
        });
        assert_eq!(options.level, Level::DEBUG);
        assert!(options.add_source_location);
        assert!(!options.add_trace_info);
        assert_eq!(options.project_id, "prod-project");
    }

    #[test]
    fn project_id_falls_back_to_google_cloud_project() {
        let options = options_from(|key| match key {
            GOOGLE_CLOUD_PROJECT_ENV => Some("runtime-project".to_string()),
            _ => None,
        });
        assert_eq!(options.project_id, "runtime-project");
    }

    #[test]
    fn unparseable_level_keeps_default() {
        for raw in ["loud", "WARN+2147483647"] {
            let options = options_from(|key| match key {
                LOG_LEVEL_ENV => Some(raw.to_string()),
                _ => None,
            });
            assert_eq!(options.level, HandlerOptions::default().level);
        }
    }

    #[test]
    fn unrecognized_bool_spellings_keep_defaults() {
        let options = options_from(|key| match key {
            SOURCE_LOCATION_ENV => Some("ye".to_string()),
            TRACE_INFO_ENV => Some("tru".to_string()),
            _ => None,
        });
        assert!(!options.add_source_location);
        assert!(options.add_trace_info);
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("narp"), None);
    }
}
