//! GUI checker options layered over the core checker configuration

use anyhow::{Context, Result};
use effcheck_core::{CheckerConfig, ConfigError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiOptions {
    /// Require `UIEffect` for writes and reads of UI fields
    #[serde(rename = "flagUIfields")]
    pub flag_ui_fields: bool,
    #[serde(flatten)]
    pub checker: CheckerConfig,
}

impl GuiOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid GUI checker options")
    }

    /// Parse host option strings, e.g. `["-AflagUIfields", "-Alint=debugSpew"]`
    ///
    /// `flagUIfields` is handled here; everything else goes to
    /// [`CheckerConfig::from_options`].
    pub fn from_options<I, S>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flag_ui_fields = false;
        let mut rest = Vec::new();
        for option in options {
            let option = option.as_ref().trim();
            match option.strip_prefix("-A").unwrap_or(option) {
                "flagUIfields" => flag_ui_fields = true,
                other if other.starts_with("flagUIfields=") => {
                    return Err(ConfigError::UnexpectedValue("flagUIfields".to_string()))
                }
                _ => rest.push(option.to_string()),
            }
        }
        Ok(Self {
            flag_ui_fields,
            checker: CheckerConfig::from_options(rest)?,
        })
    }
}
