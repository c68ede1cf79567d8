//! Configuration for the `secacl` command.
//!
//! Settings come from a TOML file resolved in this order: an explicit
//! `--config` path (or `SECACL_CONFIG`), then
//! `<config_dir>/secacl/config.toml`. A missing default file yields the
//! built-in defaults; a missing explicit file is an error.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::blob::BlobEncoding;
use crate::error::{Error, Result};

/// How decoded objects are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Human-readable summary
    Text,
}

/// Settings for the `secacl` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecaclConfig {
    /// Text encoding for blob arguments and output
    pub encoding: BlobEncoding,
    /// Output format for `decode`
    pub format: OutputFormat,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for SecaclConfig {
    fn default() -> Self {
        Self {
            encoding: BlobEncoding::default(),
            format: OutputFormat::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl SecaclConfig {
    /// Name used for the config directory and in user-facing hints.
    pub fn project_name() -> &'static str {
        "secacl"
    }

    /// Platform default location of the config file.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Explicit path if given, otherwise the platform default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_config_path(),
        }
    }

    /// Loads the effective configuration.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(Path::new(path)),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reads and parses a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::file(e, path))?;
        let config: Self = toml::from_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Serializes this configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the default configuration to `path`, creating parent
    /// directories. Refuses to overwrite unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(Error::config(format!(
                "Config file already exists at {}. Use --force to overwrite.",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::file(e, parent))?;
        }
        let text = Self::default().to_toml_string()?;
        std::fs::write(path, text).map_err(|e| Error::file(e, path))
    }
}
