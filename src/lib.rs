//! i18n-sync - locale tree synchronizer.
//!
//! Fills missing or empty translation keys in a target-language locale file
//! from an authoritative source-language file, calling a machine-translation
//! provider only for the gaps. Existing translations, array ordering, nested
//! shape and non-string scalars are always preserved.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod store;

// Re-export key types for convenience
pub use crate::core::{
    client::{GoogleTranslator, TranslationProvider},
    config::TranslatorConfig,
    errors::{Result, SyncError},
    merge::{unwrap_language_root, TreeMerger},
    models::{MergeOutcome, MergeStats},
};

pub use crate::store::TreeFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
