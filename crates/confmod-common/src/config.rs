//! Engine configuration model.

use serde::{Deserialize, Serialize};

use crate::error::{ConfmodError, Result};

/// What extraction does when a unit's label is absent from the argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingLabelPolicy {
    /// Treat the absent label as an empty object; defaults alone apply.
    #[default]
    Empty,
    /// Fail with [`ConfmodError::MissingLabel`].
    Error,
}

/// Root configuration for the composition engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Behavior when a label key is missing from the runtime argument.
    pub missing_label: MissingLabelPolicy,
}

impl EngineConfig {
    /// Strict configuration: missing labels are errors.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            missing_label: MissingLabelPolicy::Error,
        }
    }

    /// Parses an engine configuration from a JSON document.
    ///
    /// Absent fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid configuration.
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(|e| ConfmodError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient() {
        assert_eq!(
            EngineConfig::default().missing_label,
            MissingLabelPolicy::Empty
        );
    }

    #[test]
    fn parses_strict_policy() {
        let config = EngineConfig::from_json(r#"{ "missing_label": "error" }"#).expect("parse");
        assert_eq!(config, EngineConfig::strict());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json("{}").expect("parse");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn unknown_policy_is_config_error() {
        let err = EngineConfig::from_json(r#"{ "missing_label": "panic" }"#).expect_err("invalid");
        assert!(matches!(err, ConfmodError::Config { .. }));
    }
}
