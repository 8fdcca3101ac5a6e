// Translation platform access
//
// The pipeline talks to the translation-management platform through the
// PlatformClient trait; LokaliseClient is the production implementation.

pub mod lokalise;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use lokalise::LokaliseClient;
use crate::error::Result;

/// A localization key with its per-language translations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationKey {
    pub key_id: u64,
    pub key_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub language_iso: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub is_reviewed: bool,
    #[serde(default)]
    pub is_fuzzy: bool,
    #[serde(default)]
    pub words: u64,
}

/// A document upload request prepared by the pipeline.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub lang_iso: String,
    /// Base64-encoded file content
    pub data: String,
    pub detect_icu_plurals: bool,
    pub tags: Vec<String>,
    pub format_options: serde_json::Value,
}

/// Receipt returned by the platform for an accepted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub process_id: String,
    #[serde(default)]
    pub status: String,
}

impl TranslationKey {
    /// Non-empty translation for a language, if present.
    pub fn translation_for(&self, language_iso: &str) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|t| t.language_iso == language_iso && !t.translation.is_empty())
    }

    /// Set the translation for a language, creating an unreviewed fuzzy
    /// entry when none exists yet. Returns true when the entry is new.
    pub fn set_translation(&mut self, language_iso: &str, text: String) -> bool {
        let words = text.split_whitespace().count() as u64;

        if let Some(existing) = self
            .translations
            .iter_mut()
            .find(|t| t.language_iso == language_iso)
        {
            existing.translation = text;
            existing.words = words;
            false
        } else {
            self.translations.push(Translation {
                language_iso: language_iso.to_string(),
                translation: text,
                is_reviewed: false,
                is_fuzzy: true,
                words,
            });
            true
        }
    }
}

/// Operations the pipeline needs from the translation-management platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch all project keys with their translations.
    async fn fetch_keys(&self) -> Result<Vec<TranslationKey>>;

    /// Push one key's full translations list back to the platform.
    async fn update_key(&self, key: &TranslationKey) -> Result<()>;

    /// Upload a localization document for import.
    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt>;
}
