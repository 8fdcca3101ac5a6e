//! Lokara - Localization Translation Orchestrator
//!
//! This is the main entry point for the Lokara application, which drives
//! machine translation of Lokalise project keys through an
//! OpenRouter-compatible LLM endpoint and checks translation quality with a
//! BLEU-based scorer.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use lokara::cli::{Args, Commands};
use lokara::config::Config;
use lokara::glossary::{format_glossary_section, Glossary};
use lokara::pipeline::{self, KeyStatus, PipelineSummary, TranslationPipeline};
use lokara::platform::{LokaliseClient, PlatformClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Lokara - Localization Translation Orchestrator");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Execute command
    match args.command {
        Commands::Translate {
            target_lang,
            source_lang,
            force,
        } => {
            config.validate_language(&target_lang)?;

            info!("Translating project keys from {} to {}", source_lang, target_lang);
            let pipeline = TranslationPipeline::from_config(&config)?;
            let summary = pipeline
                .process_translations(&target_lang, &source_lang, force)
                .await?;

            print_summary(&summary);
        }
        Commands::CheckQuality {
            source,
            reference,
            candidate,
        } => {
            let report = pipeline::check_quality(&config.quality, &source, &reference, &candidate);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Upload {
            input,
            lang_iso,
            tags,
        } => {
            let tags = tags
                .map(|t| {
                    t.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();

            info!("Uploading {} ({})", input.display(), lang_iso);
            let platform = LokaliseClient::new(&config.platform)?;
            let receipts = pipeline::upload_path(&platform, &input, &lang_iso, &tags).await?;

            println!("\nAccepted Uploads:");
            println!("{:<40} {:<10}", "Process ID", "Status");
            println!("{}", "-".repeat(50));
            for receipt in receipts {
                println!("{:<40} {:<10}", receipt.process_id, receipt.status);
            }
        }
        Commands::Refine {
            source,
            draft,
            target_lang,
        } => {
            config.validate_language(&target_lang)?;

            let pipeline = TranslationPipeline::from_config(&config)?;
            let refined = pipeline.refine(&source, &draft, &target_lang).await?;
            println!("{}", refined);
        }
        Commands::Keys { target_lang } => {
            let platform = LokaliseClient::new(&config.platform)?;
            let keys = platform.fetch_keys().await?;

            if keys.is_empty() {
                println!("No keys found in the project.");
            } else {
                println!("\nProject Keys:");
                println!("{:<10} {:<40} {:<30}", "ID", "Name", "Translated Languages");
                println!("{}", "-".repeat(80));

                let mut translated_count = 0;
                for key in &keys {
                    let languages: Vec<&str> = key
                        .translations
                        .iter()
                        .filter(|t| !t.translation.is_empty())
                        .map(|t| t.language_iso.as_str())
                        .collect();

                    if let Some(lang) = &target_lang {
                        if key.translation_for(lang).is_some() {
                            translated_count += 1;
                        }
                    }

                    println!("{:<10} {:<40} {:<30}", key.key_id, key.key_name, languages.join(", "));
                }

                if let Some(lang) = &target_lang {
                    println!(
                        "\n{}/{} keys have a {} translation",
                        translated_count,
                        keys.len(),
                        lang
                    );
                }
            }
        }
        Commands::Glossary { text, target_lang } => {
            let glossary = Glossary::from_file(&config.glossary.path)?;
            let matches = glossary.relevant_terms(&text, &target_lang);

            if matches.is_empty() {
                println!("No glossary terms matched.");
            } else {
                println!("{}", format_glossary_section(&matches));
            }
        }
    }

    info!("Lokara workflow completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let lokara_dir = std::env::current_dir()?.join(".lokara");
    let log_dir = lokara_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "lokara.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Print a translation run summary with per-key detail lines
fn print_summary(summary: &PipelineSummary) {
    println!("\nTranslation Results:");
    println!("{:<40} {:<10} {:<50}", "Key", "Status", "Detail");
    println!("{}", "-".repeat(100));

    for outcome in &summary.details {
        let (status, detail) = match outcome.status {
            KeyStatus::Success => {
                let text = outcome.translated_text.as_deref().unwrap_or_default();
                ("success", preview(text))
            }
            KeyStatus::Skipped => ("skipped", preview(outcome.reason.as_deref().unwrap_or_default())),
            KeyStatus::Error => ("error", preview(outcome.error.as_deref().unwrap_or_default())),
        };
        println!("{:<40} {:<10} {:<50}", outcome.key_name, status, detail);
    }

    println!();
    println!("Total keys:          {}", summary.total_processed);
    println!("Successful:          {}", summary.successful);
    println!("  New translations:  {}", summary.new_translations);
    println!("  Updated:           {}", summary.updated_translations);
    println!("Skipped:             {}", summary.skipped);
    println!("Failed:              {}", summary.failed);
}

/// Truncate long detail text for table output
fn preview(text: &str) -> String {
    if text.len() > 47 {
        let cut: String = text.chars().take(47).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
