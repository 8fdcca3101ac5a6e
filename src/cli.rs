use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate all untranslated project keys and push the results back
    Translate {
        /// Target language ISO code
        #[arg(short, long)]
        target_lang: String,

        /// Source language ISO code
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Retranslate keys that already have a translation
        #[arg(short, long)]
        force: bool,
    },

    /// Score a candidate translation against an existing reference
    CheckQuality {
        /// Original source text (echoed in the report)
        #[arg(long)]
        source: String,

        /// Reference translation to compare against
        #[arg(long)]
        reference: String,

        /// Candidate translation to evaluate
        #[arg(long)]
        candidate: String,
    },

    /// Upload a localization document, or every supported file in a directory
    Upload {
        /// Localization file or directory
        #[arg(short, long)]
        input: PathBuf,

        /// Language ISO code of the uploaded content
        #[arg(short, long)]
        lang_iso: String,

        /// Tags to attach to imported keys (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Improve an existing translation using glossary context
    Refine {
        /// Original source text
        #[arg(long)]
        source: String,

        /// Current translation to improve
        #[arg(long)]
        draft: String,

        /// Target language ISO code
        #[arg(short, long)]
        target_lang: String,
    },

    /// List project keys and their translation status
    Keys {
        /// Only report coverage for this language ISO code
        #[arg(short, long)]
        target_lang: Option<String>,
    },

    /// Show glossary terms matching a text
    Glossary {
        /// Text to scan for glossary terms
        #[arg(long)]
        text: String,

        /// Target language ISO code
        #[arg(short, long)]
        target_lang: String,
    },
}
