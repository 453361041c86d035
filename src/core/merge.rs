//! Recursive translation-merge engine.
//!
//! Walks a source-language tree and a deep copy of the target-language tree
//! in lock-step, filling every missing or empty string leaf through the
//! injected [`TranslationProvider`]. Existing non-empty translations are
//! never overwritten, which makes the merge idempotent: re-running against a
//! fully-translated target performs zero provider calls. Arrays are aligned
//! by position, and non-string scalars are copied verbatim from the source.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::client::TranslationProvider;
use crate::core::errors::{Result, SyncError};
use crate::core::models::{MergeOutcome, MergeStats};

/// Merge engine bound to one provider and one language pair
#[derive(Debug)]
pub struct TreeMerger<'a, P> {
    provider: &'a P,
    source_lang: &'a str,
    target_lang: &'a str,
}

impl<'a, P: TranslationProvider + Sync> TreeMerger<'a, P> {
    /// Create a merger for one language pair
    pub fn new(provider: &'a P, source_lang: &'a str, target_lang: &'a str) -> Self {
        Self {
            provider,
            source_lang,
            target_lang,
        }
    }

    /// Produce a completed target tree from `source` and `target`.
    ///
    /// Neither input is mutated; the result starts as a deep copy of
    /// `target`, so target-only keys survive the merge. The only hard
    /// failure is a source root that is not an object; every per-leaf
    /// provider failure is contained and falls back to the source text.
    pub async fn merge(&self, source: &Value, target: &Value) -> Result<MergeOutcome> {
        let src = source.as_object().ok_or_else(|| SyncError::MalformedTree {
            message: format!("source root must be an object, got {}", value_kind(source)),
        })?;

        let mut tree = match target {
            Value::Object(_) => target.clone(),
            Value::Null => Value::Object(Map::new()),
            other => {
                warn!(
                    "target root is {}, starting from an empty tree",
                    value_kind(other)
                );
                Value::Object(Map::new())
            }
        };

        let mut stats = MergeStats::default();
        if let Value::Object(dst) = &mut tree {
            self.merge_object(src, dst, String::new(), &mut stats).await;
        }

        Ok(MergeOutcome { tree, stats })
    }

    /// Walk one object level. Boxed because the recursion is async.
    fn merge_object<'b>(
        &'b self,
        src: &'b Map<String, Value>,
        dst: &'b mut Map<String, Value>,
        path: String,
        stats: &'b mut MergeStats,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'b>> {
        Box::pin(async move {
            for (key, source_value) in src {
                let new_path = join_key(&path, key);

                match source_value {
                    Value::Array(items) => {
                        let slot = dst.entry(key.clone()).or_insert(Value::Null);
                        if !slot.is_array() {
                            *slot = Value::Array(Vec::new());
                        }
                        if let Value::Array(dst_items) = slot {
                            // Indices past the original target length are
                            // absent, not defined-as-null
                            let defined_len = dst_items.len();
                            if defined_len < items.len() {
                                dst_items.resize(items.len(), Value::Null);
                            }
                            self.merge_sequence(items, dst_items, defined_len, &new_path, stats)
                                .await;
                        }
                    }
                    Value::Object(src_obj) => {
                        let slot = dst.entry(key.clone()).or_insert(Value::Null);
                        if !slot.is_object() {
                            *slot = Value::Object(Map::new());
                        }
                        if let Value::Object(dst_obj) = slot {
                            self.merge_object(src_obj, dst_obj, new_path, stats).await;
                        }
                    }
                    Value::String(text) => {
                        // Only an absent slot or an empty string is fillable;
                        // any other existing value is left alone
                        let fillable = match dst.get(key) {
                            None => true,
                            Some(Value::String(s)) => s.is_empty(),
                            Some(_) => false,
                        };
                        if fillable {
                            let filled = self.fill_leaf(text, &new_path, stats).await;
                            dst.insert(key.clone(), Value::String(filled));
                        } else {
                            stats.preserved += 1;
                        }
                    }
                    // Numbers, booleans and null: source is authoritative
                    other => {
                        stats.copied += 1;
                        dst.insert(key.clone(), other.clone());
                    }
                }
            }
        })
    }

    /// Walk one sequence level, aligning items by index.
    ///
    /// `defined_len` is the target sequence's length before padding; items
    /// at or past it are treated as absent.
    async fn merge_sequence(
        &self,
        items: &[Value],
        dst_items: &mut [Value],
        defined_len: usize,
        path: &str,
        stats: &mut MergeStats,
    ) {
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, i);

            match item {
                Value::Object(src_obj) => {
                    if !dst_items[i].is_object() {
                        dst_items[i] = Value::Object(Map::new());
                    }
                    if let Value::Object(dst_obj) = &mut dst_items[i] {
                        self.merge_object(src_obj, dst_obj, item_path, stats).await;
                    }
                }
                Value::String(text) => {
                    let fillable = i >= defined_len
                        || matches!(&dst_items[i], Value::String(s) if s.is_empty());
                    if fillable {
                        let filled = self.fill_leaf(text, &item_path, stats).await;
                        dst_items[i] = Value::String(filled);
                    } else {
                        stats.preserved += 1;
                    }
                }
                other => {
                    stats.copied += 1;
                    dst_items[i] = other.clone();
                }
            }
        }
    }

    /// Translate one string leaf; on failure, keep the source text
    async fn fill_leaf(&self, source_text: &str, path: &str, stats: &mut MergeStats) -> String {
        if source_text.is_empty() {
            return String::new();
        }

        match self
            .provider
            .translate(source_text, self.source_lang, self.target_lang)
            .await
        {
            Ok(translation) => {
                stats.characters += source_text.chars().count() + translation.chars().count();
                stats.translated += 1;
                debug!("Translated {}: {:?} -> {:?}", path, source_text, translation);
                translation
            }
            Err(e) => {
                warn!("Failed to translate {:?} at {}: {}", source_text, path, e);
                stats.failed += 1;
                source_text.to_string()
            }
        }
    }
}

/// Unwrap a root of exactly `{ <lang>: { ... } }` down to its inner tree.
///
/// Locale modules sometimes nest all messages under the language code;
/// flat modules come back unchanged.
pub fn unwrap_language_root<'v>(tree: &'v Value, lang: &str) -> &'v Value {
    if let Some(map) = tree.as_object() {
        if map.len() == 1 {
            if let Some(inner @ Value::Object(_)) = map.get(lang) {
                return inner;
            }
        }
    }
    tree
}

/// Human-readable kind of a JSON value, for diagnostics
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Append a key to a dotted diagnostic path
fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: translates by suffixing "-fr", fails on demand
    struct FakeProvider {
        calls: AtomicUsize,
        fail_on: HashSet<String>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: HashSet::new(),
            }
        }

        fn failing_on(texts: &[&str]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: texts.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TranslationProvider for FakeProvider {
        async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(text) {
                return Err(SyncError::Network {
                    message: "connection reset".to_string(),
                });
            }
            Ok(format!("{}-fr", text))
        }
    }

    async fn run(provider: &FakeProvider, source: Value, target: Value) -> MergeOutcome {
        TreeMerger::new(provider, "en", "fr")
            .merge(&source, &target)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fills_missing_leaf() {
        let provider = FakeProvider::new();
        let outcome = run(&provider, json!({"greeting": "hello"}), json!({})).await;

        assert_json_eq!(outcome.tree, json!({"greeting": "hello-fr"}));
        assert_eq!(provider.calls(), 1);
        assert_eq!(outcome.stats.translated, 1);
        // "hello" (5) + "hello-fr" (8)
        assert_eq!(outcome.stats.characters, 13);
    }

    #[tokio::test]
    async fn preserves_existing_translation() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"greeting": "hello"}),
            json!({"greeting": "bonjour"}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"greeting": "bonjour"}));
        assert_eq!(provider.calls(), 0);
        assert_eq!(outcome.stats.preserved, 1);
    }

    #[tokio::test]
    async fn translates_empty_string_slot() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"greeting": "hello"}),
            json!({"greeting": ""}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"greeting": "hello-fr"}));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn aligns_arrays_by_index() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"items": ["a", "b"]}),
            json!({"items": ["x", ""]}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"items": ["x", "b-fr"]}));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn replaces_non_array_slot_with_sequence() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"items": ["a", 7, true]}),
            json!({"items": "not an array"}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"items": ["a-fr", 7, true]}));
        assert_eq!(provider.calls(), 1);
        assert_eq!(outcome.stats.copied, 2);
    }

    #[tokio::test]
    async fn keeps_defined_non_string_target_values() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"greeting": "hello", "note": "text"}),
            json!({"greeting": 5, "note": null}),
        )
        .await;

        // A defined slot is only fillable when it is an empty string
        assert_json_eq!(outcome.tree, json!({"greeting": 5, "note": null}));
        assert_eq!(provider.calls(), 0);
        assert_eq!(outcome.stats.preserved, 2);
    }

    #[tokio::test]
    async fn distinguishes_defined_null_item_from_padding() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"items": ["a", "b"]}),
            json!({"items": [null]}),
        )
        .await;

        // Index 0 was defined (as null) and survives; index 1 never existed
        assert_json_eq!(outcome.tree, json!({"items": [null, "b-fr"]}));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn keeps_extra_target_array_items() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"items": ["a"]}),
            json!({"items": ["x", "extra"]}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"items": ["x", "extra"]}));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn recurses_into_array_of_objects() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"faq": [{"q": "why", "a": "because"}]}),
            json!({"faq": [{"q": "pourquoi"}]}),
        )
        .await;

        assert_json_eq!(
            outcome.tree,
            json!({"faq": [{"q": "pourquoi", "a": "because-fr"}]})
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn source_scalars_are_authoritative() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"count": 5, "on": true, "gone": null}),
            json!({"count": 3, "on": false}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"count": 5, "on": true, "gone": null}));
        assert_eq!(provider.calls(), 0);
        assert_eq!(outcome.stats.copied, 3);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_source_text() {
        let provider = FakeProvider::failing_on(&["b"]);
        let outcome = run(
            &provider,
            json!({"items": ["a", "b"], "later": "c"}),
            json!({"items": ["x", ""]}),
        )
        .await;

        // "b" failed but the walk still covered "later"
        assert_json_eq!(
            outcome.tree,
            json!({"items": ["x", "b"], "later": "c-fr"})
        );
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.translated, 1);
    }

    #[tokio::test]
    async fn second_run_makes_no_calls() {
        let source = json!({
            "greeting": "hello",
            "nested": {"bye": "goodbye", "n": 1},
            "items": ["a", "b"]
        });

        let provider = FakeProvider::new();
        let first = run(&provider, source.clone(), json!({})).await;
        let first_calls = provider.calls();
        assert_eq!(first_calls, 4);

        let second = run(&provider, source, first.tree.clone()).await;
        assert_eq!(provider.calls(), first_calls);
        assert_json_eq!(second.tree, first.tree);
    }

    #[tokio::test]
    async fn replaces_non_object_slot_with_tree() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"menu": {"open": "open"}}),
            json!({"menu": "stale"}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"menu": {"open": "open-fr"}}));
    }

    #[tokio::test]
    async fn target_only_keys_survive() {
        let provider = FakeProvider::new();
        let outcome = run(
            &provider,
            json!({"a": "x"}),
            json!({"legacy": "keep me", "a": "done"}),
        )
        .await;

        assert_json_eq!(outcome.tree, json!({"legacy": "keep me", "a": "done"}));
    }

    #[tokio::test]
    async fn inputs_are_not_mutated() {
        let provider = FakeProvider::new();
        let source = json!({"a": "x", "nested": {"b": "y"}});
        let target = json!({"a": ""});

        let outcome = TreeMerger::new(&provider, "en", "fr")
            .merge(&source, &target)
            .await
            .unwrap();

        assert_json_eq!(source, json!({"a": "x", "nested": {"b": "y"}}));
        assert_json_eq!(target, json!({"a": ""}));
        assert_json_eq!(
            outcome.tree,
            json!({"a": "x-fr", "nested": {"b": "y-fr"}})
        );
    }

    #[tokio::test]
    async fn non_object_source_root_is_fatal() {
        let provider = FakeProvider::new();
        let result = TreeMerger::new(&provider, "en", "fr")
            .merge(&json!(["not", "a", "tree"]), &json!({}))
            .await;

        assert!(matches!(result, Err(SyncError::MalformedTree { .. })));
    }

    #[tokio::test]
    async fn empty_source_string_stored_without_call() {
        let provider = FakeProvider::new();
        let outcome = run(&provider, json!({"blank": ""}), json!({})).await;

        assert_json_eq!(outcome.tree, json!({"blank": ""}));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn character_count_uses_chars_not_bytes() {
        let provider = FakeProvider::new();
        let outcome = run(&provider, json!({"cn": "你好"}), json!({})).await;

        // "你好" (2 chars) + "你好-fr" (5 chars)
        assert_eq!(outcome.stats.characters, 7);
    }

    #[test]
    fn unwraps_language_indexed_root() {
        let wrapped = json!({"en": {"a": "x"}});
        assert_json_eq!(unwrap_language_root(&wrapped, "en"), &json!({"a": "x"}));

        // Wrong language, extra keys, or non-object inner: unchanged
        assert_json_eq!(unwrap_language_root(&wrapped, "zh"), &wrapped);
        let flat = json!({"en": {"a": "x"}, "b": "y"});
        assert_json_eq!(unwrap_language_root(&flat, "en"), &flat);
        let scalar = json!({"en": "x"});
        assert_json_eq!(unwrap_language_root(&scalar, "en"), &scalar);
    }
}
