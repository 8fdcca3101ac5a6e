// LLM translation
//
// The pipeline requests translations through the Translator trait;
// OpenRouterTranslator is the production implementation speaking the
// chat-completions protocol.

pub mod openrouter;

use async_trait::async_trait;

pub use openrouter::OpenRouterTranslator;
use crate::error::Result;
use crate::glossary::GlossaryMatch;

/// Machine translation operations used by the pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a source text to the target language, steering the model
    /// with the glossary terms that occur in the text.
    async fn translate(
        &self,
        source_text: &str,
        target_language: &str,
        glossary_terms: &[GlossaryMatch],
    ) -> Result<String>;

    /// Improve an existing translation using glossary context.
    async fn refine(
        &self,
        source_text: &str,
        draft_translation: &str,
        target_language: &str,
        glossary_terms: &[GlossaryMatch],
    ) -> Result<String>;
}
