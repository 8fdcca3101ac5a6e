use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, LokaraError};

fn default_page_limit() -> usize {
    1000
}

fn default_low_score_threshold() -> f64 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub platform: PlatformConfig,
    pub translate: TranslateConfig,
    pub glossary: GlossaryConfig,
    pub quality: QualityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Lokalise API endpoint URL
    pub endpoint: String,
    /// API token; falls back to LOKALISE_API_TOKEN when empty
    pub api_key: String,
    /// Lokalise project identifier
    pub project_id: String,
    /// Maximum number of keys fetched per request
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Language ISO codes accepted as translation targets
    pub supported_languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// OpenRouter-compatible chat completions endpoint URL
    pub endpoint: String,
    /// API key; falls back to OPENROUTER_API_KEY when empty
    pub api_key: String,
    /// LLM model used for translation
    pub model: String,
    /// LLM model used for translation refinement
    pub refine_model: String,
    /// Maximum retries for failed translation requests
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryConfig {
    /// Path to the glossary JSON document
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// BLEU score below which a quality check logs a warning
    #[serde(default = "default_low_score_threshold")]
    pub low_score_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: PlatformConfig {
                endpoint: "https://api.lokalise.com/api2".to_string(),
                api_key: String::new(),
                project_id: String::new(),
                page_limit: 1000,
                supported_languages: vec![
                    "en".to_string(),
                    "it".to_string(),
                    "fr".to_string(),
                    "de".to_string(),
                    "es".to_string(),
                    "pt".to_string(),
                    "nl".to_string(),
                    "pl".to_string(),
                    "ja".to_string(),
                    "ko".to_string(),
                    "zh".to_string(),
                ],
            },
            translate: TranslateConfig {
                endpoint: "https://openrouter.ai/api/v1".to_string(),
                api_key: String::new(),
                model: "openai/gpt-4o-mini".to_string(),
                refine_model: "anthropic/claude-3-opus-20240229".to_string(),
                max_retries: 3,
            },
            glossary: GlossaryConfig {
                path: PathBuf::from("glossary.json"),
            },
            quality: QualityConfig {
                low_score_threshold: 0.3,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LokaraError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| LokaraError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LokaraError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LokaraError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate that a language code is an accepted translation target
    pub fn validate_language(&self, language_iso: &str) -> Result<()> {
        if self.platform.supported_languages.is_empty() {
            return Ok(());
        }

        if self.platform.supported_languages.iter().any(|l| l == language_iso) {
            Ok(())
        } else {
            Err(LokaraError::Config(format!(
                "Language '{}' is not supported. Supported languages are: {}",
                language_iso,
                self.platform.supported_languages.join(", ")
            )))
        }
    }
}

impl PlatformConfig {
    pub fn resolve_api_key(&self) -> Result<String> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }

        std::env::var("LOKALISE_API_TOKEN").map_err(|_| {
            LokaraError::Config(
                "Lokalise API key not configured; set [platform].api_key or LOKALISE_API_TOKEN".to_string(),
            )
        })
    }
}

impl TranslateConfig {
    pub fn resolve_api_key(&self) -> Result<String> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }

        std::env::var("OPENROUTER_API_KEY").map_err(|_| {
            LokaraError::Config(
                "OpenRouter API key not configured; set [translate].api_key or OPENROUTER_API_KEY".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::default();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.platform.endpoint, config.platform.endpoint);
        assert_eq!(loaded.translate.model, config.translate.model);
        assert_eq!(loaded.platform.page_limit, 1000);
    }

    #[test]
    fn test_validate_language() {
        let config = Config::default();
        assert!(config.validate_language("it").is_ok());
        assert!(config.validate_language("xx").is_err());

        let mut open = Config::default();
        open.platform.supported_languages.clear();
        assert!(open.validate_language("xx").is_ok());
    }

    #[test]
    fn test_api_key_from_config_wins() {
        let mut config = Config::default();
        config.platform.api_key = "token-from-file".to_string();
        assert_eq!(config.platform.resolve_api_key().unwrap(), "token-from-file");
    }
}
