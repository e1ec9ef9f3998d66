//! Catalog merger: reconciles a target locale's UI-string catalog against
//! the master catalog. Master is authoritative on key structure; target
//! owns only leaf string values. Iteration follows master's key insertion
//! order (serde_json is built with `preserve_order`), which only matters
//! for log ordering, not correctness.

use crate::classify::is_skippable_text;
use crate::document::translate_unit;
use docloc_core::Result;
use docloc_translate::Translator;
use serde_json::{Map, Value};

/// Top-level key holding the locale-name registry. Always copied verbatim
/// from master, never translated, never diffed key-by-key.
pub const RESERVED_LANGUAGES_KEY: &str = "languages";

/// Merge behavior. Check mode performs no capability calls and no mutation
/// beyond scaffolding empty objects needed to recurse.
pub enum CatalogMode<'a> {
    Check,
    Apply(&'a dyn Translator),
}

/// Tagged outcome of a merge pass. Replaces the historical overloaded
/// `number | boolean | "UNSUPPORTED"` contract with explicit data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Meaningful changes: translations, structure creations, verbatim
    /// copies, deletions. Identical for check and apply over the same input.
    pub change_count: usize,
    /// Whether the target tree was (or would be) modified at all.
    pub mutated: bool,
    /// A string translation came back empty; the locale merge is aborted
    /// and its partially merged tree must not be persisted.
    pub unsupported: bool,
}

impl MergeOutcome {
    fn absorb(&mut self, other: MergeOutcome) {
        self.change_count += other.change_count;
        self.mutated |= other.mutated;
        self.unsupported |= other.unsupported;
    }
}

pub fn merge_catalog(
    master: &Map<String, Value>,
    target: &mut Map<String, Value>,
    locale_code: &str,
    mode: &CatalogMode<'_>,
) -> Result<MergeOutcome> {
    merge_node(master, target, locale_code, mode, &mut Vec::new())
}

fn merge_node(
    master: &Map<String, Value>,
    target: &mut Map<String, Value>,
    locale_code: &str,
    mode: &CatalogMode<'_>,
    path: &mut Vec<String>,
) -> Result<MergeOutcome> {
    let mut outcome = MergeOutcome::default();

    for (key, master_value) in master {
        path.push(key.clone());
        let key_path = path.join(".");

        if path.len() == 1 && key == RESERVED_LANGUAGES_KEY {
            // Routine copy; marks the file dirty but is not a meaningful
            // change worth reporting in check mode.
            if let CatalogMode::Apply(_) = mode {
                tracing::info!(event = "catalog_copy_languages", locale = locale_code);
                target.insert(key.clone(), master_value.clone());
            }
            outcome.mutated = true;
            path.pop();
            continue;
        }

        match master_value {
            Value::Object(master_child) => {
                let needs_scaffold = !matches!(target.get(key), Some(Value::Object(_)));
                if needs_scaffold {
                    tracing::info!(
                        event = "catalog_create_structure",
                        locale = locale_code,
                        key = %key_path,
                    );
                    target.insert(key.clone(), Value::Object(Map::new()));
                    outcome.change_count += 1;
                    outcome.mutated = true;
                }
                let Some(Value::Object(target_child)) = target.get_mut(key) else {
                    unreachable!("scaffolded above");
                };
                let child = merge_node(master_child, target_child, locale_code, mode, path)?;
                if child.unsupported {
                    tracing::warn!(
                        event = "catalog_unsupported",
                        locale = locale_code,
                        key = %key_path,
                    );
                    path.pop();
                    outcome.absorb(child);
                    return Ok(outcome);
                }
                outcome.absorb(child);
            }
            Value::String(master_str) => {
                let missing = match target.get(key) {
                    None | Some(Value::Null) => true,
                    Some(Value::String(s)) => s.is_empty(),
                    Some(_) => false,
                };
                if missing {
                    outcome.change_count += 1;
                    outcome.mutated = true;
                    match mode {
                        CatalogMode::Check => {
                            tracing::info!(
                                event = "catalog_would_translate",
                                locale = locale_code,
                                key = %key_path,
                            );
                        }
                        CatalogMode::Apply(translator) => {
                            match translate_leaf(*translator, master_str, locale_code, &key_path) {
                                LeafResult::Translated(v) if v.is_empty() => {
                                    outcome.unsupported = true;
                                    path.pop();
                                    return Ok(outcome);
                                }
                                LeafResult::Translated(v) | LeafResult::Copied(v) => {
                                    target.insert(key.clone(), Value::String(v));
                                }
                                // Transient failure: keep the run going with
                                // the source text for this leaf.
                                LeafResult::Failed => {
                                    target.insert(key.clone(), Value::String(master_str.clone()));
                                }
                            }
                        }
                    }
                }
            }
            other => {
                if !target.contains_key(key) {
                    tracing::info!(
                        event = "catalog_copy_non_string",
                        locale = locale_code,
                        key = %key_path,
                    );
                    outcome.change_count += 1;
                    outcome.mutated = true;
                    if let CatalogMode::Apply(_) = mode {
                        target.insert(key.clone(), other.clone());
                    }
                }
            }
        }
        path.pop();
    }

    // Prune keys no longer present in master. Destructive: callers relying
    // on target-only keys must snapshot beforehand.
    let obsolete: Vec<String> = target
        .keys()
        .filter(|k| !master.contains_key(*k))
        .cloned()
        .collect();
    for key in obsolete {
        let key_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path.join("."), key)
        };
        tracing::info!(
            event = "catalog_remove_obsolete",
            locale = locale_code,
            key = %key_path,
        );
        outcome.change_count += 1;
        outcome.mutated = true;
        if let CatalogMode::Apply(_) = mode {
            target.remove(&key);
        }
    }

    Ok(outcome)
}

/// Outcome of resolving one string leaf. Only an empty string that came
/// back from an actual capability call counts as an unsupported mapping;
/// a copied blank source is an ordinary value.
enum LeafResult {
    /// Copied without a capability call (blank or skippable source).
    Copied(String),
    Translated(String),
    /// Transient failure; the caller falls back to the source text.
    Failed,
}

fn translate_leaf(
    translator: &dyn Translator,
    text: &str,
    locale_code: &str,
    key_path: &str,
) -> LeafResult {
    if text.trim().is_empty() || is_skippable_text(text) {
        return LeafResult::Copied(text.to_string());
    }
    let provider_code = docloc_config::catalog_provider_code(locale_code);
    match translate_unit(translator, text, &provider_code) {
        Ok(v) => LeafResult::Translated(v),
        Err(err) => {
            tracing::warn!(
                event = "catalog_leaf_translation_failed",
                locale = locale_code,
                key = %key_path,
                error = %err,
            );
            LeafResult::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docloc_translate::{TranslateError, TranslateOptions};
    use serde_json::json;
    use std::cell::RefCell;

    struct StubTranslator {
        calls: RefCell<usize>,
        reply: Box<dyn Fn(&str) -> String>,
    }

    impl StubTranslator {
        fn uppercasing() -> Self {
            StubTranslator {
                calls: RefCell::new(0),
                reply: Box::new(|t| t.to_uppercase()),
            }
        }
        fn empty_replies() -> Self {
            StubTranslator {
                calls: RefCell::new(0),
                reply: Box::new(|_| String::new()),
            }
        }
    }

    impl Translator for StubTranslator {
        fn translate(
            &self,
            text: &str,
            _s: &str,
            _t: &str,
            _o: &TranslateOptions,
        ) -> std::result::Result<String, TranslateError> {
            *self.calls.borrow_mut() += 1;
            Ok((self.reply)(text))
        }
    }

    fn obj(v: serde_json::Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    fn key_sets_match(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
        if a.len() != b.len() || a.keys().any(|k| !b.contains_key(k)) {
            return false;
        }
        a.iter().all(|(k, av)| match (av, b.get(k).unwrap()) {
            (Value::Object(ac), Value::Object(bc)) => key_sets_match(ac, bc),
            (Value::Object(_), _) | (_, Value::Object(_)) => false,
            _ => true,
        })
    }

    #[test]
    fn key_sets_converge_at_every_depth() {
        let master = obj(json!({
            "nav": {"items": {"docs": "Docs", "blog": "Blog"}, "empty": {}},
            "title": "Site",
            "counts": [1, 2, 3]
        }));
        let mut target = obj(json!({"stray": "gone", "nav": "not-an-object"}));
        let stub = StubTranslator::uppercasing();
        let out = merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert!(out.mutated);
        assert!(!out.unsupported);
        assert!(key_sets_match(&master, &target));
        assert_eq!(target["nav"]["items"]["docs"], json!("DOCS"));
        assert_eq!(target["counts"], json!([1, 2, 3]));
    }

    #[test]
    fn obsolete_keys_are_deleted() {
        let master = obj(json!({"keep": "Keep"}));
        let mut target = obj(json!({"keep": "Behalten", "obsolete": "x"}));
        let stub = StubTranslator::uppercasing();
        merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert!(!target.contains_key("obsolete"));
        // manual translation untouched
        assert_eq!(target["keep"], json!("Behalten"));
    }

    #[test]
    fn manual_edits_are_never_overwritten() {
        let master = obj(json!({"greeting": "Hello", "empty": "", "fresh": "New"}));
        let mut target = obj(json!({"greeting": "Hallo (reviewed)", "empty": ""}));
        let stub = StubTranslator::uppercasing();
        merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert_eq!(target["greeting"], json!("Hallo (reviewed)"));
        // empty string counts as missing and gets filled
        assert_eq!(target["empty"], json!(""));
        assert_eq!(target["fresh"], json!("NEW"));
    }

    #[test]
    fn languages_registry_is_copied_verbatim() {
        let master = obj(json!({"languages": {"de": "Deutsch", "fr": "Français"}}));
        let mut target = obj(json!({"languages": {"de": "stale"}}));
        let stub = StubTranslator::uppercasing();
        merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert_eq!(target["languages"], master["languages"]);
        assert_eq!(*stub.calls.borrow(), 0, "registry must never be translated");
    }

    #[test]
    fn check_mode_counts_match_apply_mode_changes() {
        let master = obj(json!({
            "nav": {"docs": "Docs"},
            "title": "Site",
            "misc": [true]
        }));
        let target_initial = obj(json!({"obsolete": "x"}));

        let mut check_target = target_initial.clone();
        let check =
            merge_catalog(&master, &mut check_target, "de", &CatalogMode::Check).unwrap();

        let stub = StubTranslator::uppercasing();
        let mut apply_target = target_initial;
        let apply =
            merge_catalog(&master, &mut apply_target, "de", &CatalogMode::Apply(&stub)).unwrap();

        assert_eq!(check.change_count, apply.change_count);
        // nav structure + nav.docs + title + misc + delete obsolete
        assert_eq!(apply.change_count, 5);
    }

    #[test]
    fn check_mode_makes_no_capability_calls_and_no_string_assignments() {
        let master = obj(json!({"title": "Site"}));
        let mut target = Map::new();
        let out = merge_catalog(&master, &mut target, "de", &CatalogMode::Check).unwrap();
        assert_eq!(out.change_count, 1);
        assert!(!target.contains_key("title"));
    }

    #[test]
    fn second_apply_makes_no_further_calls_for_filled_keys() {
        let master = obj(json!({"nav": {"items": {"docs": "Docs"}}}));
        let mut target = Map::new();
        let first = StubTranslator::uppercasing();
        merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&first)).unwrap();
        assert_eq!(*first.calls.borrow(), 1);

        let second = StubTranslator::uppercasing();
        let out = merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&second)).unwrap();
        assert_eq!(*second.calls.borrow(), 0);
        assert_eq!(out.change_count, 0);
    }

    #[test]
    fn empty_master_leaf_is_copied_and_siblings_still_merge() {
        let master = obj(json!({"empty": "", "fresh": "New"}));
        let mut target = Map::new();
        let stub = StubTranslator::uppercasing();
        let out = merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert!(!out.unsupported, "a blank source value is not a failed translation");
        assert_eq!(target["empty"], json!(""));
        assert_eq!(target["fresh"], json!("NEW"));
        assert_eq!(*stub.calls.borrow(), 1, "blank leaves make no capability calls");
    }

    #[test]
    fn empty_translation_aborts_the_locale_merge() {
        let master = obj(json!({"a": "Alpha", "b": "Beta"}));
        let mut target = Map::new();
        let stub = StubTranslator::empty_replies();
        let out = merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert!(out.unsupported);
        assert_eq!(*stub.calls.borrow(), 1, "merge stops at the first empty result");
    }

    #[test]
    fn skippable_leaves_are_copied_without_calls() {
        let master = obj(json!({"separator": "---", "table": "| a |"}));
        let mut target = Map::new();
        let stub = StubTranslator::uppercasing();
        merge_catalog(&master, &mut target, "de", &CatalogMode::Apply(&stub)).unwrap();
        assert_eq!(*stub.calls.borrow(), 0);
        assert_eq!(target["separator"], json!("---"));
    }
}
