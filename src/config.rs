use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use logscope_types::DEFAULT_PAGE_SIZE;

/// Default config file name, looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "logscope.toml";

/// CLI configuration (`logscope.toml`).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub view: ViewConfig,
    pub export: ExportConfig,
}

/// Table view defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Export destination defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration: an explicit path must exist; otherwise
    /// `logscope.toml` is used when present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.view.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.export.directory, PathBuf::from("."));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [view]
            page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.view.page_size, 25);
        // Unspecified sections keep their defaults
        assert_eq!(config.export.directory, PathBuf::from("."));
    }
}
