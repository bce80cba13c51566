//! Tracing bootstrap for the simulation service.
//!
//! Filter precedence: an explicit `RUST_LOG` wins; otherwise the configured
//! level applies, with chatty HTTP internals capped at warn.

use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Directives appended when the filter is derived from the configured level.
const QUIET_DEPENDENCIES: &str = "hyper=warn,tower=warn,mio=warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}'")]
    Filter { value: String, source: ParseError },
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Install)
}

fn level_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    let directives = format!("{level},{QUIET_DEPENDENCIES}");
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::Filter {
        value: level.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        assert!(level_filter("debug").is_ok());
        assert!(level_filter("casesim=trace").is_ok());
    }

    #[test]
    fn malformed_level_reports_the_offending_value() {
        let error = level_filter("not=a=filter").expect_err("invalid filter rejected");
        match error {
            TelemetryError::Filter { value, .. } => assert_eq!(value, "not=a=filter"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
