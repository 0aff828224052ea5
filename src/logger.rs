//! # Logger
//!
//! Installs the global `tracing` subscriber from [`config::Logger`].

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{config, Error, Result};

// Crates whose traces are shown when no override filter is configured.
const MODULE_WHITELIST: &[&str] = &["neont_rs", "neont"];

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(level)
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

fn filter_directives(config: &config::Logger) -> String {
    config.override_filter.clone().unwrap_or_else(|| {
        MODULE_WHITELIST
            .iter()
            .map(|module| format!("{module}={}", config.level))
            .collect::<Vec<_>>()
            .join(",")
    })
}

/// Initializes the global subscriber; a disabled logger installs nothing.
///
/// Logs go to stderr so that command output on stdout stays parseable.
///
/// # Errors
///
/// Fails when the filter is invalid or a subscriber is already installed.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(config)))
        .map_err(Error::msg)?;

    let layer = match config.format {
        Format::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        Format::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        Format::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_follow_configured_level() {
        let config = config::Logger {
            level: LogLevel::Debug,
            ..config::Logger::default()
        };
        assert_eq!(filter_directives(&config), "neont_rs=debug,neont=debug");
    }

    #[test]
    fn override_filter_wins() {
        let config = config::Logger {
            override_filter: Some("trace".to_string()),
            ..config::Logger::default()
        };
        assert_eq!(filter_directives(&config), "trace");
    }

    #[test]
    fn disabled_logger_is_a_no_op() {
        let config = config::Logger {
            enable: false,
            ..config::Logger::default()
        };
        assert!(init(&config).is_ok());
    }
}
