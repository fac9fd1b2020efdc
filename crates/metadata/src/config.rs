use crate::error::{MetadataError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for graph construction behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Reject entries without a recognised type instead of warning
    pub strict_types: bool,

    /// Accept a second entry with the same kind and name.
    /// The later record wins the name lookup; both stay in document order.
    pub allow_duplicate_entries: bool,

    /// Check parent/child consistency after every construction
    pub validate_tree: bool,

    /// Drop clones whose target never resolved right after construction
    pub prune_unresolved_clones: bool,

    /// How chatty structural diagnostics are
    pub diagnostics: DiagnosticLevel,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            strict_types: false,
            allow_duplicate_entries: false,
            validate_tree: true,
            prune_unresolved_clones: false,
            diagnostics: DiagnosticLevel::Info,
        }
    }
}

impl BuildConfig {
    /// Fail on anything questionable in the input records
    pub fn strict() -> Self {
        Self {
            strict_types: true,
            prune_unresolved_clones: true,
            ..Default::default()
        }
    }

    /// Accept everything the original document tooling accepted
    pub fn lenient() -> Self {
        Self {
            allow_duplicate_entries: true,
            diagnostics: DiagnosticLevel::Quiet,
            ..Default::default()
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| MetadataError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.strict_types && self.allow_duplicate_entries {
            return Err(MetadataError::config(
                "strict_types cannot be combined with allow_duplicate_entries",
            ));
        }
        Ok(())
    }
}

/// Verbosity of the library's structural diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Emit nothing below error level
    Quiet,

    /// Structural warnings only
    Warn,

    /// Warnings plus the build summary line
    #[default]
    Info,

    /// Summary plus per-pass progress
    Debug,
}

impl DiagnosticLevel {
    pub(crate) fn warns(self) -> bool {
        self >= Self::Warn
    }

    pub(crate) fn informs(self) -> bool {
        self >= Self::Info
    }

    pub(crate) fn debugs(self) -> bool {
        self >= Self::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(BuildConfig::default().validate().is_ok());
        assert!(BuildConfig::strict().validate().is_ok());
        assert!(BuildConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_contradictory_config_rejected() {
        let config = BuildConfig {
            strict_types: true,
            allow_duplicate_entries: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BuildConfig::from_toml_str("strict_types = true\ndiagnostics = \"debug\"\n").unwrap();
        assert!(config.strict_types);
        assert!(config.validate_tree);
        assert_eq!(config.diagnostics, DiagnosticLevel::Debug);
    }

    #[test]
    fn test_diagnostic_levels_are_ordered() {
        assert_eq!(BuildConfig::default().diagnostics, DiagnosticLevel::Info);
        let warn = BuildConfig::from_toml_str("diagnostics = \"warn\"\n").unwrap().diagnostics;
        assert!(warn.warns());
        assert!(!warn.informs());
        assert!(DiagnosticLevel::Info.informs());
        assert!(!DiagnosticLevel::Info.debugs());
        assert!(!DiagnosticLevel::Quiet.warns());
    }

    #[test]
    fn test_toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.toml");
        std::fs::write(&path, "prune_unresolved_clones = true\n").unwrap();
        let config = BuildConfig::from_toml_file(&path).unwrap();
        assert!(config.prune_unresolved_clones);
        assert!(!config.strict_types);
    }
}
