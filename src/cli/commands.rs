//! CLI command handlers

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::core::client::GoogleTranslator;
use crate::core::merge::{unwrap_language_root, TreeMerger};
use crate::store::{self, TreeFormat};

/// Synchronize one target locale file against its source-language file.
///
/// When `target_file` is omitted it is derived by walking one directory
/// level up from the source file: `<grandparent>/<target_lang>/translation.json`,
/// matching the `public/locales/<lang>/translation.json` layout.
pub async fn handle_sync(
    source_lang: String,
    source_file: PathBuf,
    target_lang: String,
    target_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let target_file = match target_file {
        Some(path) => path,
        None => derive_target_path(&source_file, &target_lang)?,
    };

    info!("Source: {} ({})", source_file.display(), source_lang);
    info!("Target: {} ({})", target_file.display(), target_lang);

    // Reject an unwritable output form before spending any translation calls
    TreeFormat::from_path(&target_file)?;

    let source_tree = store::read_tree(&source_file).await?;
    let source_tree = unwrap_language_root(&source_tree, &source_lang);

    let target_tree = if target_file.exists() {
        store::read_tree(&target_file).await?
    } else {
        info!(
            "Target file {} not found. Creating a new one.",
            target_file.display()
        );
        serde_json::json!({})
    };

    let provider = GoogleTranslator::from_env()?;
    let merger = TreeMerger::new(&provider, &source_lang, &target_lang);
    let outcome = merger.merge(source_tree, &target_tree).await?;

    store::write_tree(&target_file, &target_lang, &outcome.tree).await?;

    let duration = start_time.elapsed();
    let stats = &outcome.stats;
    info!(
        "Completed: {} translated, {} preserved, {} failed in {:?}",
        stats.translated, stats.preserved, stats.failed, duration
    );

    println!("\n✅ Synchronized {}", target_file.display());
    println!("   Translated: {}", stats.translated);
    println!("   Preserved:  {}", stats.preserved);
    if stats.failed > 0 {
        println!("   Failed:     {} (source text kept)", stats.failed);
    }
    println!("   Characters (estimated): {}", stats.characters);
    println!("   Time: {:?}", duration);

    Ok(())
}

/// Default target path: `<grandparent-of-source>/<target_lang>/translation.json`
fn derive_target_path(source_file: &Path, target_lang: &str) -> anyhow::Result<PathBuf> {
    let grandparent = source_file
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "cannot derive a target path from {}; pass one explicitly",
                source_file.display()
            )
        })?;

    Ok(grandparent.join(target_lang).join("translation.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_sibling_locale_directory() {
        let derived =
            derive_target_path(Path::new("public/locales/zh/translation.json"), "en").unwrap();
        assert_eq!(derived, PathBuf::from("public/locales/en/translation.json"));
    }

    #[test]
    fn derivation_fails_for_bare_filename() {
        assert!(derive_target_path(Path::new("translation.json"), "en").is_err());
    }
}
