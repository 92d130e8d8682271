//! Harness configuration
//!
//! Policies the observed workflow leaves open are configuration, not
//! hard-coded behavior.

use crate::error::{HarnessError, HarnessResult};
use collection_model::CommitMessagePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How search-and-add treats several matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPolicy {
    /// More than one match is `NotFound` listing the candidates
    #[default]
    RejectAmbiguous,
    /// Take the earliest-created match
    PickFirst,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Prefix prepended to navigation paths
    pub server_url_prefix: String,
    /// Search-and-add tie-break policy
    pub search_policy: SearchPolicy,
    /// When saves require a commit message
    pub commit_message_policy: CommitMessagePolicy,
    /// Message used by the incremental growth steps
    pub growth_commit_message: String,
    /// Log format for the binary
    pub log_format: LogFormat,
}

impl HarnessConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file; missing fields take defaults
    ///
    /// # Errors
    /// `HarnessError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `HarnessError::Config` on malformed input.
    pub fn from_toml(raw: &str) -> HarnessResult<Self> {
        toml::from_str(raw).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `HarnessError::Config` if serialization fails.
    pub fn to_toml(&self) -> HarnessResult<String> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// With search policy
    #[inline]
    #[must_use]
    pub fn with_search_policy(mut self, policy: SearchPolicy) -> Self {
        self.search_policy = policy;
        self
    }

    /// With commit message policy
    #[inline]
    #[must_use]
    pub fn with_commit_message_policy(mut self, policy: CommitMessagePolicy) -> Self {
        self.commit_message_policy = policy;
        self
    }

    /// With URL prefix
    #[inline]
    #[must_use]
    pub fn with_server_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.server_url_prefix = prefix.into();
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Absolute URL for a path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url_prefix.trim_end_matches('/'), path)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_url_prefix: "http://localhost:9001".to_string(),
            search_policy: SearchPolicy::default(),
            commit_message_policy: CommitMessagePolicy::default(),
            growth_commit_message: "Add Exploration".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = HarnessConfig::from_toml(
            r#"
            search_policy = "pick_first"
            commit_message_policy = "always"
            "#,
        )
        .unwrap();
        assert_eq!(config.search_policy, SearchPolicy::PickFirst);
        assert_eq!(config.commit_message_policy, CommitMessagePolicy::Always);
        assert_eq!(config.growth_commit_message, "Add Exploration");
    }

    #[test]
    fn toml_round_trip() {
        let config = HarnessConfig::new().with_log_format(LogFormat::Json);
        let parsed = HarnessConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = HarnessConfig::from_toml("search_policy = 3").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn url_joins_prefix() {
        let config = HarnessConfig::new().with_server_url_prefix("http://sut:8181/");
        assert_eq!(config.url("/collection/c1"), "http://sut:8181/collection/c1");
    }
}
