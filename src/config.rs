use crate::error::{Result, VizError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const OUTPUT_DIR_ENV: &str = "VIZBRIDGE_OUTPUT_DIR";
pub const DEFAULT_OUTPUT_DIR: &str = "viz_outputs";

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

/// Process-level settings. Per-request options win over `width`/`height`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            width: None,
            height: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| VizError::Config(format!("invalid TOML: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VizError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Optional file, then `VIZBRIDGE_OUTPUT_DIR`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_override(std::env::var(OUTPUT_DIR_ENV).ok()))
    }

    fn with_env_override(mut self, output_dir: Option<String>) -> Self {
        if let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.output_dir, PathBuf::from("viz_outputs"));
        assert_eq!((config.width, config.height), (None, None));
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_toml_str(
            r#"
            output_dir = "/tmp/charts"
            width = 800
            height = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/charts"));
        assert_eq!((config.width, config.height), (Some(800), Some(600)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("colour = \"red\"").unwrap_err();
        assert!(matches!(err, VizError::Config(_)));
    }

    #[test]
    fn test_env_override() {
        let config = Config::default().with_env_override(Some("/srv/out".into()));
        assert_eq!(config.output_dir, PathBuf::from("/srv/out"));
        let config = Config::default().with_env_override(Some("  ".into()));
        assert_eq!(config.output_dir, PathBuf::from("viz_outputs"));
    }
}
