/*!
 * Configuration types for psbridge
 */

use serde::{Deserialize, Serialize};

/// Environment variable that pins the host version (label or raw suffix)
pub const VERSION_ENV: &str = "PS_VERSION";

/// Environment variable selecting log verbosity
pub const LOG_LEVEL_ENV: &str = "PS_LOG_LEVEL";

/// Main configuration for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Version override; takes precedence over hints passed to constructors
    #[serde(default)]
    pub version: Option<String>,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Vendor root of every program identifier
    #[serde(default = "default_vendor_root")]
    pub vendor_root: String,

    /// Registry key (under the local machine hive) holding one subkey per installed version
    #[serde(default = "default_registry_path")]
    pub registry_path: String,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            version: None,
            log_level: LogLevel::default(),
            vendor_root: default_vendor_root(),
            registry_path: default_registry_path(),
        }
    }
}

impl AutomationConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let version = lookup(VERSION_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let log_level = lookup(LOG_LEVEL_ENV)
            .map(|v| LogLevel::parse(&v))
            .unwrap_or_default();

        Self {
            version,
            log_level,
            ..Default::default()
        }
    }

    /// Load configuration from a JSON document
    pub fn from_json(contents: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    #[default]
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Parse a level name; unknown names fall back to the quiet default
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" => LogLevel::Trace,
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" | "CRITICAL" => LogLevel::Error,
            _ => LogLevel::default(),
        }
    }

    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_vendor_root() -> String {
    "Photoshop".to_string()
}

fn default_registry_path() -> String {
    "SOFTWARE\\Adobe\\Photoshop".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AutomationConfig::default();
        assert_eq!(config.version, None);
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.vendor_root, "Photoshop");
        assert_eq!(config.registry_path, "SOFTWARE\\Adobe\\Photoshop");
    }

    #[test]
    fn test_from_lookup() {
        let config = AutomationConfig::from_lookup(lookup_from(&[
            ("PS_VERSION", " 2024 "),
            ("PS_LOG_LEVEL", "debug"),
        ]));
        assert_eq!(config.version.as_deref(), Some("2024"));
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_blank_version_is_ignored() {
        let config = AutomationConfig::from_lookup(lookup_from(&[("PS_VERSION", "  ")]));
        assert_eq!(config.version, None);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::parse("WARNING"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("CRITICAL"), LogLevel::Error);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Error);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = AutomationConfig::from_json(r#"{"version": "190", "log_level": "info"}"#)
            .unwrap();
        assert_eq!(config.version.as_deref(), Some("190"));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.vendor_root, "Photoshop");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = AutomationConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::AutomationError::Config(_)));
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
