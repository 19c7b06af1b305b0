//! User configuration (`config.toml`).

use crate::error::CliError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sheetcast_core::GridSize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Dimensions of newly created sheets.
    pub rows: usize,
    pub cols: usize,
    /// User the console acts as until `login`.
    pub user: String,
    /// Log filter used when `SHEETCAST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: 100,
            cols: 100,
            user: "local".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// `<config dir>/sheetcast/config.toml`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("", "", "sheetcast")?;
        let mut path = proj.config_dir().to_path_buf();
        path.push("config.toml");
        Some(path)
    }

    /// Load from an explicit path (which must exist) or the default location
    /// (where a missing file means defaults).
    pub fn load(explicit: Option<&Path>) -> Result<Config, CliError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Config, CliError> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(CliError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "file too large ({} bytes, max {})",
                    meta.len(),
                    MAX_CONFIG_FILE_BYTES
                ),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| CliError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str) -> Result<Config, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.rows == 0 || config.cols == 0 {
            return Err("rows and cols must be at least 1".to_string());
        }
        Ok(config)
    }

    pub fn sheet_size(&self) -> GridSize {
        GridSize::new(self.rows, self.cols)
    }
}
