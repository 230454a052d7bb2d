use crate::billing::client::{DEFAULT_ENDPOINT, MAX_PAGE_SIZE};
use crate::billing::{MatchPolicy, COMPUTE_ENGINE_SERVICE_ID};
use crate::error::ConfigError;
use crate::report::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the Cloud Billing API key.
pub const API_KEY_ENV: &str = "TFCOST_BILLING_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub reference: ReferenceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub service_id: String,
    pub endpoint: String,
    /// Overridden by `TFCOST_BILLING_API_KEY`
    pub api_key: Option<String>,
    pub currency_code: String,
    pub page_size: u32,
    pub retry_attempts: u32,
    /// Read SKUs from this file instead of the API
    pub sku_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// What to do when several SKUs match a component
    pub ambiguity: MatchPolicy,
}

/// Replacement tables for the built-in reference data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub machine_types: Option<PathBuf>,
    pub disk_types: Option<PathBuf>,
    pub images: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            service_id: COMPUTE_ENGINE_SERVICE_ID.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            currency_code: "USD".to_string(),
            page_size: MAX_PAGE_SIZE,
            retry_attempts: 5,
            sku_file: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .tfcost.toml in current dir, then ~/.config/tfcost/config.toml
            let local = PathBuf::from(".tfcost.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("tfcost").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".tfcost.toml"))
            }
        };

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            toml::from_str::<Config>(&content).map_err(|e| {
                ConfigError::ParseError(format!(
                    "{}: {}\n  Tip: Run 'tfcost init' to create a new config file",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            // Use defaults but warn if user explicitly provided a path
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!("   Using default configuration. Run 'tfcost init' to create a config file.");
            }
            Config::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.catalog.api_key = Some(key);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let catalog = &self.catalog;
        if catalog.service_id.is_empty() {
            return Err(ConfigError::MissingField("catalog.service_id".to_string()));
        }
        if catalog.page_size == 0 || catalog.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "catalog.page_size".to_string(),
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if catalog.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.retry_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.catalog.service_id, "6F81-5844-456A");
        assert_eq!(config.catalog.page_size, 5000);
        assert_eq!(config.matching.ambiguity, MatchPolicy::Warn);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = Config::default();
        config.matching.ambiguity = MatchPolicy::Reject;
        config.catalog.sku_file = Some(PathBuf::from("skus.json"));
        assert!(config.save(&config_path).is_ok());
        assert!(config_path.exists());

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(loaded.matching.ambiguity, MatchPolicy::Reject);
        assert_eq!(loaded.catalog.sku_file, Some(PathBuf::from("skus.json")));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        std::fs::write(&config_path, "[matching]\nambiguity = \"first\"\n\n[output]\nformat = \"html\"\n").unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.matching.ambiguity, MatchPolicy::First);
        assert_eq!(config.output.format, OutputFormat::Html);
        assert!(config.output.color);
        assert_eq!(config.catalog.currency_code, "USD");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let fake_path = temp_dir.path().join("nonexistent.toml");

        // Should return default config
        let config = Config::load(Some(&fake_path)).unwrap();
        assert_eq!(config.catalog.retry_attempts, 5);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid toml content {").unwrap();

        let err = Config::load(Some(&config_path)).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        std::fs::write(&config_path, "[catalog]\npage_size = 0\n").unwrap();
        assert!(Config::load(Some(&config_path)).is_err());

        std::fs::write(&config_path, "[matching]\nambiguity = \"random\"\n").unwrap();
        assert!(Config::load(Some(&config_path)).is_err());
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("init_test.toml");

        assert!(init_config(&config_path).is_ok());
        assert!(config_path.exists());

        // Verify it's valid TOML
        let mut config = Config::load(Some(&config_path)).unwrap();
        config.catalog.api_key = None;
        assert_eq!(config, Config::default());
    }
}
