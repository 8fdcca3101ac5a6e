use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, LokaraError};
use crate::glossary::{format_glossary_section, GlossaryMatch};
use super::Translator;

/// Translator backed by an OpenRouter-compatible chat completions API.
pub struct OpenRouterTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    refine_model: String,
    max_retries: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenRouterTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("HTTP client creation should not fail");

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            refine_model: config.refine_model.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Send one chat completion, retrying transport failures up to the
    /// configured limit.
    async fn complete(&self, model: &str, prompt: String) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let mut attempt = 0;
        loop {
            debug!("Sending completion request to {} (attempt {})", url, attempt + 1);

            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    let chat_response: ChatResponse = response.json().await.map_err(|e| {
                        LokaraError::Translation(format!("Failed to parse response: {}", e))
                    })?;

                    let content = chat_response
                        .choices
                        .into_iter()
                        .next()
                        .map(|choice| choice.message.content)
                        .ok_or_else(|| {
                            LokaraError::Translation("Completion response had no choices".to_string())
                        })?;

                    let cleaned = clean_response(&content);
                    if cleaned.is_empty() {
                        return Err(LokaraError::Translation("Empty translation received".to_string()));
                    }

                    return Ok(cleaned);
                }
                Ok(response) => {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(LokaraError::Translation(format!(
                        "Completion API error {}: {}",
                        status, error_text
                    )));
                }
                Err(e) if attempt < self.max_retries => {
                    warn!("Completion request failed (attempt {}): {}", attempt + 1, e);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(LokaraError::Translation(format!("HTTP request failed: {}", e)));
                }
            }
        }
    }
}

#[async_trait]
impl Translator for OpenRouterTranslator {
    async fn translate(
        &self,
        source_text: &str,
        target_language: &str,
        glossary_terms: &[GlossaryMatch],
    ) -> Result<String> {
        let prompt = build_translation_prompt(source_text, target_language, glossary_terms);
        self.complete(&self.model, prompt).await
    }

    async fn refine(
        &self,
        source_text: &str,
        draft_translation: &str,
        target_language: &str,
        glossary_terms: &[GlossaryMatch],
    ) -> Result<String> {
        let prompt =
            build_refine_prompt(source_text, draft_translation, target_language, glossary_terms);
        self.complete(&self.refine_model, prompt).await
    }
}

fn build_translation_prompt(
    source_text: &str,
    target_language: &str,
    glossary_terms: &[GlossaryMatch],
) -> String {
    format!(
        "Translate the following text to {}.\n\
         \n\
         Here is the glossary:\n\
         {}\n\
         \n\
         Translation Guidelines:\n\
         1. Maintain the original meaning, tone, and formatting\n\
         2. Use the provided glossary terms exactly as shown when they appear\n\
         3. Preserve any special characters, numbers, or formatting\n\
         4. Keep any untranslatable terms (like product names) unchanged\n\
         5. Maintain any HTML or markdown formatting if present\n\
         \n\
         Text to translate:\n\
         {}\n\
         \n\
         Translation:",
        language_code_to_name(target_language),
        format_glossary_section(glossary_terms),
        source_text
    )
}

fn build_refine_prompt(
    source_text: &str,
    draft_translation: &str,
    target_language: &str,
    glossary_terms: &[GlossaryMatch],
) -> String {
    format!(
        "Please improve this translation using the provided glossary terms:\n\
         \n\
         Source Text: {}\n\
         Initial Translation: {}\n\
         Target Language: {}\n\
         \n\
         {}\n\
         \n\
         Please provide an improved translation that:\n\
         1. Accurately reflects the source meaning\n\
         2. Uses the correct glossary terms\n\
         3. Maintains natural language flow\n\
         4. Is culturally appropriate\n\
         \n\
         Return only the improved translation, without commentary.",
        source_text,
        draft_translation,
        language_code_to_name(target_language),
        format_glossary_section(glossary_terms)
    )
}

/// Convert a language code to a full language name for clearer prompts
fn language_code_to_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" => "English".to_string(),
        "it" => "Italian".to_string(),
        "fr" => "French".to_string(),
        "de" => "German".to_string(),
        "es" => "Spanish".to_string(),
        "pt" => "Portuguese".to_string(),
        "nl" => "Dutch".to_string(),
        "pl" => "Polish".to_string(),
        "ru" => "Russian".to_string(),
        "tr" => "Turkish".to_string(),
        "sv" => "Swedish".to_string(),
        "da" => "Danish".to_string(),
        "no" => "Norwegian".to_string(),
        "fi" => "Finnish".to_string(),
        "cs" => "Czech".to_string(),
        "hu" => "Hungarian".to_string(),
        "uk" => "Ukrainian".to_string(),
        "ar" => "Arabic".to_string(),
        "he" => "Hebrew".to_string(),
        "hi" => "Hindi".to_string(),
        "th" => "Thai".to_string(),
        "vi" => "Vietnamese".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "zh" => "Chinese".to_string(),
        _ => code.to_string(),
    }
}

/// Strip surrounding markdown code fences and whitespace from a completion.
fn clean_response(response: &str) -> String {
    let text = response.trim();

    if text.starts_with("```") && text.ends_with("```") && text.len() > 6 {
        let inner = &text[3..text.len() - 3];
        // Drop an optional language tag on the opening fence
        let inner = match inner.split_once('\n') {
            Some((first_line, rest)) if !first_line.trim().contains(' ') => rest,
            _ => inner,
        };
        return inner.trim().to_string();
    }

    if text.starts_with('`') && text.ends_with('`') && text.len() > 2 {
        return text[1..text.len() - 1].trim().to_string();
    }

    text.to_string()
}
