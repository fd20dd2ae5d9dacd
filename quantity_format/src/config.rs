//! Locale configuration file support.
//!
//! Separator defaults for new formats come from a [`LocaleSeparators`] value.
//! It can be built in code or read from the `[locale]` table of a TOML file:
//!
//! ```toml
//! [locale]
//! decimal_separator = ","
//! thousand_separator = "."
//! station_separator = "+"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FormatError, FormatResult};

/// Separators used when a format does not override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleSeparators {
    pub decimal: char,
    pub thousand: char,
    pub station: char,
}

impl Default for LocaleSeparators {
    fn default() -> Self {
        Self {
            decimal: '.',
            thousand: ',',
            station: '+',
        }
    }
}

/// Format engine configuration from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default)]
    pub locale: LocaleSettings,
}

/// Locale settings as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleSettings {
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    #[serde(default = "default_thousand_separator")]
    pub thousand_separator: String,
    #[serde(default = "default_station_separator")]
    pub station_separator: String,
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

fn default_thousand_separator() -> String {
    ",".to_string()
}

fn default_station_separator() -> String {
    "+".to_string()
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            decimal_separator: default_decimal_separator(),
            thousand_separator: default_thousand_separator(),
            station_separator: default_station_separator(),
        }
    }
}

impl FormatConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(FormatConfig)` if successful
    /// * `Err(FormatError::Config)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> FormatResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            FormatError::config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> FormatResult<Self> {
        let config: FormatConfig = toml::from_str(content)
            .map_err(|e| FormatError::config(format!("Failed to parse config file: {}", e)))?;

        // Separators must be single characters.
        config.locale_separators()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `quantity_format.toml` in the current directory and then
    /// in the parent directory. Falls back to the built-in defaults when no
    /// file exists.
    pub fn from_default_location() -> FormatResult<Self> {
        let search_paths = [
            PathBuf::from("quantity_format.toml"),
            PathBuf::from("../quantity_format.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("Loading format configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Resolve the configured separators.
    pub fn locale_separators(&self) -> FormatResult<LocaleSeparators> {
        Ok(LocaleSeparators {
            decimal: single_char("decimal_separator", &self.locale.decimal_separator)?,
            thousand: single_char("thousand_separator", &self.locale.thousand_separator)?,
            station: single_char("station_separator", &self.locale.station_separator)?,
        })
    }
}

fn single_char(key: &str, value: &str) -> FormatResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FormatError::config(format!(
            "'locale.{}' must be exactly one character, got '{}'",
            key, value
        ))),
    }
}
