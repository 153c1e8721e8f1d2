//! Checker configuration
//!
//! Configuration is resolved once, before a checker is built, and never
//! changes afterwards. It can be read from JSON or from the `key=value`
//! option strings hosts usually forward from their command line.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which diagnostics and effects are ignored
///
/// Each toggle is off when `None`. When set, its list names the message keys
/// (or, for `ignore_effects`, the effect names) it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuppressionConfig {
    pub ignore_effects: Option<Vec<String>>,
    pub ignore_warnings: Option<Vec<String>>,
    pub ignore_errors: Option<Vec<String>>,
}

impl SuppressionConfig {
    pub fn ignoring_effects(&self) -> bool {
        self.ignore_effects.is_some()
    }

    pub fn ignoring_warnings(&self) -> bool {
        self.ignore_warnings.is_some()
    }

    pub fn ignoring_errors(&self) -> bool {
        self.ignore_errors.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckerConfig {
    #[serde(flatten)]
    pub suppression: SuppressionConfig,
    /// Log every visited method and pushed effect
    pub debug_spew: bool,
}

impl CheckerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid checker configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read checker configuration {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Parse host option strings such as `-AignoreErrors=call.invalid.effect`
    ///
    /// A toggle given without a value is switched on with an empty list.
    /// Values are comma separated.
    pub fn from_options<I, S>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = CheckerConfig::default();
        for option in options {
            let option = option.as_ref().trim();
            let option = option.strip_prefix("-A").unwrap_or(option);
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (option, None),
            };
            match key {
                "ignoreEffects" => config.suppression.ignore_effects = Some(split_list(value)),
                "ignoreWarnings" => config.suppression.ignore_warnings = Some(split_list(value)),
                "ignoreErrors" => config.suppression.ignore_errors = Some(split_list(value)),
                "lint" => {
                    for lint in split_list(value) {
                        match lint.as_str() {
                            "debugSpew" => config.debug_spew = true,
                            "-debugSpew" => config.debug_spew = false,
                            _ => return Err(ConfigError::UnknownLint(lint)),
                        }
                    }
                }
                "debugSpew" => {
                    if value.is_some() {
                        return Err(ConfigError::UnexpectedValue(key.to_string()));
                    }
                    config.debug_spew = true;
                }
                _ => return Err(ConfigError::UnknownOption(key.to_string())),
            }
        }
        Ok(config)
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_suppresses_nothing() {
        let config = CheckerConfig::default();
        assert!(!config.suppression.ignoring_effects());
        assert!(!config.suppression.ignoring_warnings());
        assert!(!config.suppression.ignoring_errors());
        assert!(!config.debug_spew);
    }

    #[test]
    fn test_options_with_and_without_values() {
        let config = CheckerConfig::from_options([
            "-AignoreErrors=call.invalid.effect, constructor.call.invalid",
            "ignoreWarnings",
            "lint=debugSpew",
        ])
        .unwrap();

        assert_eq!(
            config.suppression.ignore_errors,
            Some(vec!["call.invalid.effect".to_string(), "constructor.call.invalid".to_string()])
        );
        assert_eq!(config.suppression.ignore_warnings, Some(vec![]));
        assert_eq!(config.suppression.ignore_effects, None);
        assert!(config.debug_spew);
    }

    #[test]
    fn test_unknown_options_are_rejected() {
        assert_eq!(
            CheckerConfig::from_options(["ignoreEverything"]),
            Err(ConfigError::UnknownOption("ignoreEverything".to_string()))
        );
        assert_eq!(
            CheckerConfig::from_options(["lint=verbose"]),
            Err(ConfigError::UnknownLint("verbose".to_string()))
        );
        assert_eq!(
            CheckerConfig::from_options(["debugSpew=yes"]),
            Err(ConfigError::UnexpectedValue("debugSpew".to_string()))
        );
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = r#"{"ignoreEffects": ["UI"], "debugSpew": true}"#;
        let config = CheckerConfig::from_json_str(json).unwrap();
        assert_eq!(config.suppression.ignore_effects, Some(vec!["UI".to_string()]));
        assert!(config.debug_spew);
        assert!(CheckerConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ignoreErrors": ["override.effect.invalid"]}}"#).unwrap();

        let config = CheckerConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.suppression.ignore_errors,
            Some(vec!["override.effect.invalid".to_string()])
        );
        assert!(CheckerConfig::from_file(Path::new("/nonexistent/effcheck.json")).is_err());
    }
}
