//! Runtime Configuration
//!
//! A small set of knobs shared by the server and the client half of the
//! runtime. Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! marker_attribute = "data-watch"
//! preserve_focus = true
//! payload_global = "__STONE__"
//! log_history = 50
//! log_filter = "stone_core=info"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Attribute that flags an element as observed by the marked-node tier.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-watch";

/// Global property the registration payload is assigned to.
pub const DEFAULT_PAYLOAD_GLOBAL: &str = "__STONE__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Reserved boolean attribute placed on elements whose text or attributes
    /// change between renders.
    pub marker_attribute: String,

    /// Record and restore focus around structural patches.
    pub preserve_focus: bool,

    /// Name of the global the handoff payload is assigned to.
    pub payload_global: String,

    /// Number of log events kept by [`RecentLogs`](crate::logging::RecentLogs).
    pub log_history: usize,

    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            preserve_focus: true,
            payload_global: DEFAULT_PAYLOAD_GLOBAL.to_string(),
            log_history: 50,
            log_filter: "stone_core=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let marker = self.marker_attribute.as_str();
        if marker.is_empty() || marker.chars().any(|c| c.is_whitespace() || "\"'<>=/".contains(c)) {
            return Err(Error::Config(format!(
                "marker_attribute `{marker}` is not a valid attribute name"
            )));
        }

        let global = self.payload_global.as_str();
        let is_identifier = global
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            && global.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !is_identifier {
            return Err(Error::Config(format!(
                "payload_global `{global}` is not a script identifier"
            )));
        }

        if self.log_history == 0 {
            return Err(Error::Config("log_history must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.marker_attribute, "data-watch");
    }

    #[test]
    fn fields_override_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            marker_attribute = "data-live"
            preserve_focus = false
            "#,
        )
        .unwrap();

        assert_eq!(config.marker_attribute, "data-live");
        assert!(!config.preserve_focus);
        assert_eq!(config.payload_global, "__STONE__");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(RuntimeConfig::from_toml_str(r#"marker_attribute = "data watch""#).is_err());
        assert!(RuntimeConfig::from_toml_str(r#"payload_global = "9lives""#).is_err());
        assert!(RuntimeConfig::from_toml_str("log_history = 0").is_err());
        assert!(RuntimeConfig::from_toml_str("unknown = 1").is_err());
    }
}
