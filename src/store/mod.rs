//! Persisted tree store: reads and writes locale trees on disk.
//!
//! Two textual forms are recognized by extension: `.json` files parsed
//! directly, and `.js` locale modules whose exported object literal is
//! extracted and parsed by [`module_literal`] without evaluating any code.

pub mod module_literal;

use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::core::errors::{Result, SyncError};

/// Serialization form of a locale file, keyed off its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    /// Plain JSON document
    Json,
    /// JS locale module exporting an object literal
    Module,
}

impl TreeFormat {
    /// Determine the form from a file path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(TreeFormat::Json),
            "js" => Ok(TreeFormat::Module),
            _ => Err(SyncError::OutputFormat { extension }),
        }
    }
}

/// Read and parse a locale tree from `path`
pub async fn read_tree(path: &Path) -> Result<Value> {
    // An unreadable extension on the read path is an input problem
    let format = TreeFormat::from_path(path).map_err(|_| SyncError::InputFormat {
        path: path.display().to_string(),
        message: "unrecognized locale file extension (expected .json or .js)".to_string(),
    })?;

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    parse_tree(&content, format).map_err(|e| SyncError::InputFormat {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Parse locale text in the given form
fn parse_tree(content: &str, format: TreeFormat) -> Result<Value> {
    match format {
        TreeFormat::Json => Ok(serde_json::from_str(content)?),
        TreeFormat::Module => {
            let literal = module_literal::extract_object_literal(content)?;
            module_literal::parse_object_literal(literal)
        }
    }
}

/// Serialize `tree` in the form matching `path` and write it out.
///
/// The parent directory is created when missing, so a first run can
/// materialize `<parent>/<lang>/translation.json` in one go.
pub async fn write_tree(path: &Path, lang: &str, tree: &Value) -> Result<()> {
    let content = serialize_tree(path, lang, tree)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating directory {}", parent.display());
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::File {
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
        }
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| SyncError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    info!("Updated {}", path.display());
    Ok(())
}

/// Render `tree` as text in the form matching `path`
pub fn serialize_tree(path: &Path, lang: &str, tree: &Value) -> Result<String> {
    match TreeFormat::from_path(path)? {
        TreeFormat::Json => {
            let mut content = serde_json::to_string_pretty(tree)?;
            content.push('\n');
            Ok(content)
        }
        TreeFormat::Module => module_literal::to_module_source(lang, tree),
    }
}
