//! Optional defaults read from `.wlicloud.yaml`.
//!
//! The file is looked up in the current directory first, then in the home directory.
//! Command line flags always take precedence.
//!
//! ```yaml
//! encoding: gbk
//! format: pcd
//! ascii: false
//! double_precision: false
//! skip_invalid: true
//! log_level: debug
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cloud::CloudFormat;

pub const CONFIG_FILE_NAME: &str = ".wlicloud.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// WHATWG label of the `.dat` codepage.
    pub encoding: Option<String>,
    /// Output format when neither `--format` nor an output extension decides it.
    pub format: Option<CloudFormat>,
    pub ascii: bool,
    pub double_precision: bool,
    pub skip_invalid: bool,
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the first config file found, or defaults if there is none.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Unable to read config {}", path.display()))?;
                Config::from_yaml(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))
            }
            None => Ok(Config::default()),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let mut path = std::env::current_dir()
        .ok()
        .map(|p| p.join(CONFIG_FILE_NAME));

    if path.as_ref().map_or(true, |p| !p.exists()) {
        path = dirs::home_dir().map(|p| p.join(CONFIG_FILE_NAME));
    }

    path.filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let config = Config::from_yaml(
            "encoding: windows-1252\nformat: laz\nascii: true\ndouble_precision: true\nskip_invalid: true\nlog_level: debug\n",
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                encoding: Some("windows-1252".to_string()),
                format: Some(CloudFormat::Laz),
                ascii: true,
                double_precision: true,
                skip_invalid: true,
                log_level: Some("debug".to_string()),
            }
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = Config::from_yaml("format: ply\n").unwrap();
        assert_eq!(config.format, Some(CloudFormat::Ply));
        assert!(!config.ascii);
        assert!(config.encoding.is_none());
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_yaml("colour: blue\n").is_err());
        assert!(Config::from_yaml("format: obj\n").is_err());
    }
}
