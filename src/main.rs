//! Main entry point for the i18n-sync CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use i18n_sync::cli::commands;

/// Fill missing translation keys in a locale file via machine translation
#[derive(Parser, Debug)]
#[command(
    name = "i18n-sync",
    version,
    about,
    after_help = "Example: i18n-sync zh public/locales/zh/translation.json en"
)]
struct Args {
    /// Source language code (e.g. zh)
    source_lang: String,

    /// Source locale file (.json or .js module)
    source_file: PathBuf,

    /// Target language code
    #[arg(default_value = "en")]
    target_lang: String,

    /// Target locale file; derived from the source path when omitted
    target_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("i18n_sync={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    commands::handle_sync(
        args.source_lang,
        args.source_file,
        args.target_lang,
        args.target_file,
    )
    .await
}
