use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PlatformConfig;
use crate::error::{Result, LokaraError};
use super::{DocumentUpload, PlatformClient, Translation, TranslationKey, UploadReceipt};

/// Lokalise REST API client.
pub struct LokaliseClient {
    client: Client,
    endpoint: String,
    api_key: String,
    project_id: String,
    page_limit: usize,
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    #[serde(default)]
    keys: Vec<TranslationKey>,
}

#[derive(Debug, Serialize)]
struct UpdateKeyRequest<'a> {
    translations: &'a [Translation],
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    process: ProcessInfo,
}

#[derive(Debug, Deserialize)]
struct ProcessInfo {
    process_id: String,
    #[serde(default)]
    status: String,
}

impl LokaliseClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        if config.project_id.is_empty() {
            return Err(LokaraError::Config(
                "Lokalise project id not configured; set [platform].project_id".to_string(),
            ));
        }

        let api_key = config.resolve_api_key()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("HTTP client creation should not fail");

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            project_id: config.project_id.clone(),
            page_limit: config.page_limit,
        })
    }

    fn project_url(&self, suffix: &str) -> String {
        format!("{}/projects/{}/{}", self.endpoint, self.project_id, suffix)
    }

    async fn error_for(&self, operation: &str, response: reqwest::Response) -> LokaraError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        LokaraError::Platform(format!("{} failed {}: {}", operation, status, body))
    }
}

#[async_trait]
impl PlatformClient for LokaliseClient {
    async fn fetch_keys(&self) -> Result<Vec<TranslationKey>> {
        let url = self.project_url("keys");
        debug!("Fetching keys from {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Token", &self.api_key)
            .query(&[
                ("include_translations", "1".to_string()),
                ("limit", self.page_limit.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for("Fetching keys", response).await);
        }

        let keys_response: KeysResponse = response.json().await?;
        info!("Fetched {} keys from project {}", keys_response.keys.len(), self.project_id);

        Ok(keys_response.keys)
    }

    async fn update_key(&self, key: &TranslationKey) -> Result<()> {
        let url = self.project_url(&format!("keys/{}", key.key_id));
        debug!("Updating key {} ({})", key.key_id, key.key_name);

        let response = self
            .client
            .put(&url)
            .header("X-Api-Token", &self.api_key)
            .json(&UpdateKeyRequest {
                translations: &key.translations,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self
                .error_for(&format!("Updating key '{}'", key.key_name), response)
                .await);
        }

        Ok(())
    }

    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt> {
        let url = self.project_url("files/upload");
        info!("Uploading {} ({})", upload.filename, upload.lang_iso);

        let mut body = json!({
            "filename": upload.filename,
            "lang_iso": upload.lang_iso,
            "detect_icu_plurals": upload.detect_icu_plurals,
            "replace_modified": false,
            "skip_detect_lang_iso": false,
            "convert_placeholders": true,
            "format_options": upload.format_options,
            "data": upload.data,
        });
        if !upload.tags.is_empty() {
            body["tags"] = json!(upload.tags);
        }

        let response = self
            .client
            .post(&url)
            .header("X-Api-Token", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self
                .error_for(&format!("Uploading '{}'", upload.filename), response)
                .await);
        }

        let upload_response: UploadResponse = response.json().await?;
        Ok(UploadReceipt {
            process_id: upload_response.process.process_id,
            status: upload_response.process.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_new_requires_project_id() {
        let mut config = Config::default().platform;
        config.api_key = "token".to_string();

        assert!(matches!(
            LokaliseClient::new(&config),
            Err(LokaraError::Config(_))
        ));

        config.project_id = "123.abc".to_string();
        let client = LokaliseClient::new(&config).unwrap();
        assert_eq!(
            client.project_url("keys"),
            "https://api.lokalise.com/api2/projects/123.abc/keys"
        );
    }

    #[test]
    fn test_keys_response_parses_platform_payload() {
        let payload = r#"{
            "project_id": "123.abc",
            "keys": [
                {
                    "key_id": 7,
                    "key_name": "welcome.title",
                    "tags": ["onboarding"],
                    "platforms": ["web"],
                    "translations": [
                        {"language_iso": "en", "translation": "Welcome", "is_reviewed": true, "is_fuzzy": false, "words": 1},
                        {"language_iso": "it", "translation": ""}
                    ]
                }
            ]
        }"#;

        let parsed: KeysResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.keys.len(), 1);

        let key = &parsed.keys[0];
        assert_eq!(key.key_name, "welcome.title");
        assert_eq!(key.translations.len(), 2);
        assert!(key.translation_for("it").is_none());
        assert_eq!(key.translation_for("en").unwrap().words, 1);
    }

    #[test]
    fn test_upload_response_parses_process_receipt() {
        let payload = r#"{"project_id": "123.abc", "process": {"process_id": "proc-1", "type": "file-import", "status": "queued"}}"#;
        let parsed: UploadResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.process.process_id, "proc-1");
        assert_eq!(parsed.process.status, "queued");
    }
}
