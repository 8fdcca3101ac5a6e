use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, LokaraError};

/// Domain glossary loaded from a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Glossary {
    pub translations: Vec<GlossaryTerm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub translations: Vec<TermTranslation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermTranslation {
    pub language_iso: String,
    pub translation: String,
}

/// A glossary term that occurs in a source text, resolved for one target
/// language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryMatch {
    pub term: String,
    pub translation: String,
    pub description: String,
    pub part_of_speech: String,
}

impl Glossary {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LokaraError::Glossary(format!("Failed to read glossary {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| LokaraError::Glossary(format!("Failed to parse glossary {}: {}", path.display(), e)))
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Select the terms that appear in the source text (case-insensitive
    /// substring match) and have a translation for the target language.
    pub fn relevant_terms(&self, source_text: &str, target_language: &str) -> Vec<GlossaryMatch> {
        let source_lower = source_text.to_lowercase();
        let mut matches = Vec::new();

        for entry in &self.translations {
            if !source_lower.contains(&entry.term.to_lowercase()) {
                continue;
            }

            let target = entry
                .translations
                .iter()
                .find(|t| t.language_iso == target_language);

            if let Some(target) = target {
                matches.push(GlossaryMatch {
                    term: entry.term.clone(),
                    translation: target.translation.clone(),
                    description: entry.description.clone(),
                    part_of_speech: entry.part_of_speech.clone(),
                });
            }
        }

        debug!("Matched {} glossary terms for target '{}'", matches.len(), target_language);
        matches
    }
}

/// Format matched terms as a prompt section. Returns an empty string when
/// there is nothing to inject.
pub fn format_glossary_section(terms: &[GlossaryMatch]) -> String {
    if terms.is_empty() {
        return String::new();
    }

    let mut formatted = Vec::new();
    for term in terms {
        let mut lines = vec![format!("- {} -> {}", term.term, term.translation)];
        if !term.description.is_empty() {
            lines.push(format!("  Description: {}", term.description));
        }
        if !term.part_of_speech.is_empty() {
            lines.push(format!("  Part of Speech: {}", term.part_of_speech));
        }
        formatted.push(lines.join("\n"));
    }

    format!("Glossary Terms:\n{}", formatted.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_glossary() -> Glossary {
        serde_json::from_str(
            r#"{
                "translations": [
                    {
                        "term": "Dashboard",
                        "description": "Main landing view",
                        "part_of_speech": "noun",
                        "translations": [
                            {"language_iso": "it", "translation": "Dashboard"},
                            {"language_iso": "de", "translation": "Übersicht"}
                        ]
                    },
                    {
                        "term": "invoice",
                        "translations": [
                            {"language_iso": "it", "translation": "fattura"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_relevant_terms_matches_case_insensitively() {
        let glossary = sample_glossary();
        let matches = glossary.relevant_terms("Open the dashboard to see your INVOICE", "it");

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].term, "Dashboard");
        assert_eq!(matches[1].translation, "fattura");
    }

    #[test]
    fn test_relevant_terms_requires_target_language() {
        let glossary = sample_glossary();
        let matches = glossary.relevant_terms("Send the invoice", "de");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_relevant_terms_ignores_absent_terms() {
        let glossary = sample_glossary();
        let matches = glossary.relevant_terms("Nothing relevant here", "it");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_format_glossary_section() {
        let glossary = sample_glossary();
        let matches = glossary.relevant_terms("dashboard", "it");
        let section = format_glossary_section(&matches);

        assert!(section.starts_with("Glossary Terms:"));
        assert!(section.contains("- Dashboard -> Dashboard"));
        assert!(section.contains("Description: Main landing view"));
        assert!(section.contains("Part of Speech: noun"));

        assert_eq!(format_glossary_section(&[]), "");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"translations": [{{"term": "invoice", "translations": [{{"language_iso": "it", "translation": "fattura"}}]}}]}}"#
        )
        .unwrap();

        let glossary = Glossary::from_file(file.path()).unwrap();
        assert_eq!(glossary.translations.len(), 1);
        assert_eq!(glossary.translations[0].term, "invoice");

        assert!(Glossary::from_file("/nonexistent/glossary.json").is_err());
    }
}
