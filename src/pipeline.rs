use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, QualityConfig};
use crate::error::{Result, LokaraError};
use crate::formats;
use crate::glossary::Glossary;
use crate::platform::{DocumentUpload, LokaliseClient, PlatformClient, TranslationKey, UploadReceipt};
use crate::score;
use crate::translate::{OpenRouterTranslator, Translator};

/// Orchestrates key fetching, LLM translation, write-back, document upload
/// and quality checking.
pub struct TranslationPipeline {
    platform: Arc<dyn PlatformClient>,
    translator: Arc<dyn Translator>,
    glossary: Glossary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Success,
    Skipped,
    Error,
}

/// Per-key result of a translation run.
#[derive(Debug, Clone, Serialize)]
pub struct KeyOutcome {
    pub key_id: u64,
    pub key_name: String,
    pub status: KeyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_translation: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub new_translations: usize,
    pub updated_translations: usize,
    pub details: Vec<KeyOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityCheckReport {
    pub bleu_score: f64,
    pub translations: EchoedTranslations,
}

#[derive(Debug, Clone, Serialize)]
pub struct EchoedTranslations {
    pub source_text: String,
    pub reference_translation: String,
    pub candidate_translation: String,
}

struct PendingKey {
    key: TranslationKey,
    source_text: String,
    had_translation: bool,
}

impl KeyOutcome {
    fn new(key: &TranslationKey, status: KeyStatus) -> Self {
        Self {
            key_id: key.key_id,
            key_name: key.key_name.clone(),
            status,
            reason: None,
            error: None,
            source_text: None,
            translated_text: None,
            existing_translation: None,
            is_new_translation: None,
        }
    }
}

impl TranslationPipeline {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        translator: Arc<dyn Translator>,
        glossary: Glossary,
    ) -> Self {
        Self {
            platform,
            translator,
            glossary,
        }
    }

    /// Build the production pipeline from configuration. A missing glossary
    /// file is tolerated and logged; the pipeline then runs without term
    /// injection.
    pub fn from_config(config: &Config) -> Result<Self> {
        let platform = Arc::new(LokaliseClient::new(&config.platform)?);
        let translator = Arc::new(OpenRouterTranslator::new(&config.translate)?);

        let glossary = if config.glossary.path.exists() {
            Glossary::from_file(&config.glossary.path)?
        } else {
            warn!(
                "Glossary file {} not found, translating without glossary terms",
                config.glossary.path.display()
            );
            Glossary::default()
        };

        Ok(Self::new(platform, translator, glossary))
    }

    /// Translate every key that is missing a target-language translation and
    /// push the results back to the platform.
    pub async fn process_translations(
        &self,
        target_language: &str,
        source_language: &str,
        force_translate: bool,
    ) -> Result<PipelineSummary> {
        let keys = self.platform.fetch_keys().await?;
        let total = keys.len();

        let mut outcomes = Vec::new();
        let mut pending = Vec::new();

        for key in keys {
            let source_text = key
                .translation_for(source_language)
                .map(|t| t.translation.clone());

            let Some(source_text) = source_text else {
                let mut outcome = KeyOutcome::new(&key, KeyStatus::Skipped);
                outcome.reason = Some(format!("No {} source text available", source_language));
                outcomes.push(outcome);
                continue;
            };

            let existing = key
                .translation_for(target_language)
                .map(|t| t.translation.clone());

            if let Some(existing) = &existing {
                if !force_translate {
                    let mut outcome = KeyOutcome::new(&key, KeyStatus::Skipped);
                    outcome.reason = Some("Translation already exists".to_string());
                    outcome.source_text = Some(source_text);
                    outcome.existing_translation = Some(existing.clone());
                    outcomes.push(outcome);
                    continue;
                }
            }

            pending.push(PendingKey {
                key,
                source_text,
                had_translation: existing.is_some(),
            });
        }

        info!(
            "Translating {} of {} keys to {}",
            pending.len(),
            total,
            target_language
        );

        let translations = self.translate_pending(&pending, target_language).await;

        for (item, translation) in pending.into_iter().zip(translations) {
            let PendingKey {
                mut key,
                source_text,
                had_translation,
            } = item;

            match translation {
                Ok(translated_text) => {
                    key.set_translation(target_language, translated_text.clone());

                    match self.platform.update_key(&key).await {
                        Ok(()) => {
                            let mut outcome = KeyOutcome::new(&key, KeyStatus::Success);
                            outcome.source_text = Some(source_text);
                            outcome.translated_text = Some(translated_text);
                            outcome.is_new_translation = Some(!had_translation);
                            outcomes.push(outcome);
                        }
                        Err(e) => {
                            warn!("Failed to upload key '{}': {}", key.key_name, e);
                            let mut outcome = KeyOutcome::new(&key, KeyStatus::Error);
                            outcome.error = Some(format!("Upload failed: {}", e));
                            outcomes.push(outcome);
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to translate key '{}': {}", key.key_name, e);
                    let mut outcome = KeyOutcome::new(&key, KeyStatus::Error);
                    outcome.error = Some(e.to_string());
                    outcomes.push(outcome);
                }
            }
        }

        Ok(summarize(outcomes))
    }

    /// Fan translation requests out as concurrent tasks, returning results
    /// in the order of the pending list.
    async fn translate_pending(
        &self,
        pending: &[PendingKey],
        target_language: &str,
    ) -> Vec<Result<String>> {
        let progress = ProgressBar::new(pending.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut join_set = JoinSet::new();

        for (index, item) in pending.iter().enumerate() {
            let translator = Arc::clone(&self.translator);
            let terms = self.glossary.relevant_terms(&item.source_text, target_language);
            let source_text = item.source_text.clone();
            let target_language = target_language.to_string();
            let progress = progress.clone();

            join_set.spawn(async move {
                let result = translator
                    .translate(&source_text, &target_language, &terms)
                    .await;
                progress.inc(1);
                (index, result)
            });
        }

        let mut results: Vec<Result<String>> = (0..pending.len())
            .map(|_| Err(LokaraError::Translation("Translation task was aborted".to_string())))
            .collect();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = result,
                Err(e) => warn!("Translation task panicked: {}", e),
            }
        }

        progress.finish_and_clear();
        results
    }

    /// Improve an existing translation using glossary context.
    pub async fn refine(
        &self,
        source_text: &str,
        draft_translation: &str,
        target_language: &str,
    ) -> Result<String> {
        let terms = self.glossary.relevant_terms(source_text, target_language);
        self.translator
            .refine(source_text, draft_translation, target_language, &terms)
            .await
    }
}

/// Score a candidate translation against an existing reference.
pub fn check_quality(
    quality: &QualityConfig,
    source_text: &str,
    reference_translation: &str,
    candidate_translation: &str,
) -> QualityCheckReport {
    let bleu_score = score::score(reference_translation, candidate_translation);

    if bleu_score < quality.low_score_threshold {
        warn!(
            "BLEU score {:.3} is below threshold {:.3}",
            bleu_score, quality.low_score_threshold
        );
    }

    QualityCheckReport {
        bleu_score,
        translations: EchoedTranslations {
            source_text: source_text.to_string(),
            reference_translation: reference_translation.to_string(),
            candidate_translation: candidate_translation.to_string(),
        },
    }
}

/// Upload one localization document, or every supported document under a
/// directory.
pub async fn upload_path<P: AsRef<Path>>(
    platform: &dyn PlatformClient,
    path: P,
    lang_iso: &str,
    tags: &[String],
) -> Result<Vec<UploadReceipt>> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut receipts = Vec::new();

        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy();
            if formats::format_name(&filename).is_none() {
                continue;
            }

            match upload_file(platform, entry.path(), lang_iso, tags).await {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => warn!("Failed to upload {}: {}", entry.path().display(), e),
            }
        }

        if receipts.is_empty() {
            return Err(LokaraError::Config(format!(
                "No supported localization files found in {}",
                path.display()
            )));
        }

        Ok(receipts)
    } else {
        Ok(vec![upload_file(platform, path, lang_iso, tags).await?])
    }
}

async fn upload_file(
    platform: &dyn PlatformClient,
    path: &Path,
    lang_iso: &str,
    tags: &[String],
) -> Result<UploadReceipt> {
    formats::validate_upload(path)?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| LokaraError::Config("Invalid upload filename".to_string()))?;

    let content = tokio::fs::read(path).await?;

    let upload = DocumentUpload {
        format_options: formats::detect_format_options(&filename),
        filename,
        lang_iso: lang_iso.to_string(),
        data: STANDARD.encode(content),
        detect_icu_plurals: true,
        tags: tags.to_vec(),
    };

    platform.upload_document(upload).await
}

fn summarize(details: Vec<KeyOutcome>) -> PipelineSummary {
    let successful = details.iter().filter(|o| o.status == KeyStatus::Success).count();
    let failed = details.iter().filter(|o| o.status == KeyStatus::Error).count();
    let skipped = details.iter().filter(|o| o.status == KeyStatus::Skipped).count();
    let new_translations = details
        .iter()
        .filter(|o| o.status == KeyStatus::Success && o.is_new_translation == Some(true))
        .count();
    let updated_translations = details
        .iter()
        .filter(|o| o.status == KeyStatus::Success && o.is_new_translation == Some(false))
        .count();

    PipelineSummary {
        total_processed: details.len(),
        successful,
        failed,
        skipped,
        new_translations,
        updated_translations,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MockPlatformClient, Translation};
    use crate::translate::MockTranslator;

    fn key(id: u64, name: &str, translations: &[(&str, &str)]) -> TranslationKey {
        TranslationKey {
            key_id: id,
            key_name: name.to_string(),
            description: None,
            tags: vec![],
            platforms: vec![],
            translations: translations
                .iter()
                .map(|(lang, text)| Translation {
                    language_iso: lang.to_string(),
                    translation: text.to_string(),
                    is_reviewed: false,
                    is_fuzzy: false,
                    words: text.split_whitespace().count() as u64,
                })
                .collect(),
        }
    }

    fn pipeline_with(platform: MockPlatformClient, translator: MockTranslator) -> TranslationPipeline {
        TranslationPipeline::new(Arc::new(platform), Arc::new(translator), Glossary::default())
    }

    #[tokio::test]
    async fn test_skips_key_without_source_text() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_fetch_keys()
            .returning(|| Ok(vec![key(1, "orphan", &[("it", "ciao")])]));
        platform.expect_update_key().times(0);

        let mut translator = MockTranslator::new();
        translator.expect_translate().times(0);

        let pipeline = pipeline_with(platform, translator);
        let summary = pipeline.process_translations("it", "en", false).await.unwrap();

        assert_eq!(summary.total_processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.successful, 0);
        assert_eq!(
            summary.details[0].reason.as_deref(),
            Some("No en source text available")
        );
    }

    #[tokio::test]
    async fn test_skips_already_translated_key() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_fetch_keys()
            .returning(|| Ok(vec![key(1, "greeting", &[("en", "Hello"), ("it", "Ciao")])]));
        platform.expect_update_key().times(0);

        let mut translator = MockTranslator::new();
        translator.expect_translate().times(0);

        let pipeline = pipeline_with(platform, translator);
        let summary = pipeline.process_translations("it", "en", false).await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(
            summary.details[0].existing_translation.as_deref(),
            Some("Ciao")
        );
    }

    #[tokio::test]
    async fn test_translates_and_uploads_missing_translation() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_fetch_keys()
            .returning(|| Ok(vec![key(1, "greeting", &[("en", "Hello")])]));
        platform
            .expect_update_key()
            .times(1)
            .withf(|key| key.translation_for("it").map(|t| t.translation.as_str()) == Some("Ciao"))
            .returning(|_| Ok(()));

        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .times(1)
            .returning(|_, _, _| Ok("Ciao".to_string()));

        let pipeline = pipeline_with(platform, translator);
        let summary = pipeline.process_translations("it", "en", false).await.unwrap();

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.new_translations, 1);
        assert_eq!(summary.updated_translations, 0);
        assert_eq!(summary.details[0].translated_text.as_deref(), Some("Ciao"));
        assert_eq!(summary.details[0].is_new_translation, Some(true));
    }

    #[tokio::test]
    async fn test_force_retranslates_existing_translation() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_fetch_keys()
            .returning(|| Ok(vec![key(1, "greeting", &[("en", "Hello"), ("it", "Salve")])]));
        platform.expect_update_key().times(1).returning(|_| Ok(()));

        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .times(1)
            .returning(|_, _, _| Ok("Ciao".to_string()));

        let pipeline = pipeline_with(platform, translator);
        let summary = pipeline.process_translations("it", "en", true).await.unwrap();

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.new_translations, 0);
        assert_eq!(summary.updated_translations, 1);
    }

    #[tokio::test]
    async fn test_translation_failure_is_reported_per_key() {
        let mut platform = MockPlatformClient::new();
        platform.expect_fetch_keys().returning(|| {
            Ok(vec![
                key(1, "good", &[("en", "Hello")]),
                key(2, "bad", &[("en", "World")]),
            ])
        });
        platform.expect_update_key().times(1).returning(|_| Ok(()));

        let mut translator = MockTranslator::new();
        translator.expect_translate().returning(|source, _, _| {
            if source == "Hello" {
                Ok("Ciao".to_string())
            } else {
                Err(LokaraError::Translation("model unavailable".to_string()))
            }
        });

        let pipeline = pipeline_with(platform, translator);
        let summary = pipeline.process_translations("it", "en", false).await.unwrap();

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        let failed = summary
            .details
            .iter()
            .find(|o| o.status == KeyStatus::Error)
            .unwrap();
        assert_eq!(failed.key_name, "bad");
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported_per_key() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_fetch_keys()
            .returning(|| Ok(vec![key(1, "greeting", &[("en", "Hello")])]));
        platform
            .expect_update_key()
            .returning(|_| Err(LokaraError::Platform("rate limited".to_string())));

        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|_, _, _| Ok("Ciao".to_string()));

        let pipeline = pipeline_with(platform, translator);
        let summary = pipeline.process_translations("it", "en", false).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert!(summary.details[0]
            .error
            .as_deref()
            .unwrap()
            .contains("Upload failed"));
    }

    #[test]
    fn test_check_quality_report_shape() {
        let quality = Config::default().quality;

        let report = check_quality(&quality, "Hello", "Ciao mondo intero oggi", "Ciao mondo intero oggi");
        assert_eq!(report.bleu_score, 1.0);
        assert_eq!(report.translations.source_text, "Hello");

        let report = check_quality(&quality, "Hello", "Ciao mondo", "");
        assert_eq!(report.bleu_score, 0.0);
    }

    #[tokio::test]
    async fn test_upload_path_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"not a localization file").unwrap();

        let mut platform = MockPlatformClient::new();
        platform.expect_upload_document().times(0);

        let result = upload_path(&platform, &path, "en", &[]).await;
        assert!(matches!(result, Err(LokaraError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_upload_directory_walks_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("readme.md"), b"docs").unwrap();

        let mut platform = MockPlatformClient::new();
        platform
            .expect_upload_document()
            .times(1)
            .withf(|upload| upload.filename == "en.json" && !upload.data.is_empty())
            .returning(|_| {
                Ok(UploadReceipt {
                    process_id: "proc-1".to_string(),
                    status: "queued".to_string(),
                })
            });

        let receipts = upload_path(&platform, dir.path(), "en", &[]).await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].process_id, "proc-1");
    }
}
