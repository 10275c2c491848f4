use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use herd_intake_core::store::DEFAULT_NAMESPACE;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            namespace: default_namespace(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/intake.sqlite")
}
fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: default_excerpt_chars(),
            preview_rows: default_preview_rows(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_excerpt_chars() -> usize {
    1000
}
fn default_preview_rows() -> usize {
    10
}
fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScoringConfig {
    /// Seed for the mock scorer. Unset means a fresh draw every run.
    #[serde(default)]
    pub seed: Option<u64>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.storage.namespace.trim().is_empty() {
        anyhow::bail!("storage.namespace must not be empty");
    }
    if config.ingest.excerpt_chars == 0 {
        anyhow::bail!("ingest.excerpt_chars must be > 0");
    }
    if config.ingest.preview_rows == 0 {
        anyhow::bail!("ingest.preview_rows must be > 0");
    }
    if config.ingest.max_file_bytes == 0 {
        anyhow::bail!("ingest.max_file_bytes must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.storage.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.ingest.excerpt_chars, 1000);
        assert_eq!(config.ingest.preview_rows, 10);
        assert_eq!(config.scoring.seed, None);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            r#"
[storage]
path = "/tmp/x.sqlite"
namespace = "farm_a"

[ingest]
preview_rows = 3

[scoring]
seed = 42
"#,
        )
        .unwrap();
        assert_eq!(config.storage.path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(config.storage.namespace, "farm_a");
        assert_eq!(config.ingest.preview_rows, 3);
        assert_eq!(config.ingest.excerpt_chars, 1000);
        assert_eq!(config.scoring.seed, Some(42));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(parse("[ingest]\nexcerpt_chars = 0\n").is_err());
        assert!(parse("[ingest]\npreview_rows = 0\n").is_err());
        assert!(parse("[storage]\nnamespace = \"  \"\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/intake.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
