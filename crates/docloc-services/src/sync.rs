//! Sync orchestrator: enumerates locales, mirrors the master directory
//! tree, dispatches per-document / per-catalog work and aggregates the run
//! report. Strictly sequential; failure of one unit is logged and never
//! cancels its siblings. Check mode inspects files but performs zero
//! capability calls and zero writes.

use crate::catalog::{merge_catalog, CatalogMode};
use crate::document::{translate_document, DocumentMode};
use crate::stale::needs_translation;
use crate::util::{list_markdown_files, mirror_directories, write_atomic};
use color_eyre::eyre::{bail, eyre};
use docloc_config::{find_locale, locales_for, DoclocConfig, Locale, LocaleSet};
use docloc_core::{Result, SyncMode};
use docloc_domain::{LocaleReport, PendingChange, SyncReport};
use docloc_translate::Translator;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Resolved filesystem layout of one documentation site.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub content_dir: PathBuf,
    pub docs_subdir: String,
    pub locales_dir: PathBuf,
    pub master_lang: String,
}

impl SitePaths {
    pub fn resolve(root: &Path, cfg: &DoclocConfig) -> SitePaths {
        SitePaths {
            content_dir: root.join(cfg.content_dir.as_deref().unwrap_or("content")),
            docs_subdir: cfg.docs_subdir.clone().unwrap_or_else(|| "docs".to_string()),
            locales_dir: root.join(cfg.locales_dir.as_deref().unwrap_or("i18n")),
            master_lang: cfg
                .master_lang
                .clone()
                .unwrap_or_else(|| docloc_config::MASTER_LANG.to_string()),
        }
    }

    pub fn master_docs_dir(&self) -> PathBuf {
        self.content_dir.join(&self.master_lang).join(&self.docs_subdir)
    }

    pub fn locale_docs_dir(&self, code: &str) -> PathBuf {
        self.content_dir.join(code).join(&self.docs_subdir)
    }

    pub fn master_catalog(&self) -> PathBuf {
        self.locales_dir.join(format!("{}.json", self.master_lang))
    }

    pub fn catalog_for(&self, code: &str) -> PathBuf {
        self.locales_dir.join(format!("{code}.json"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Dry-run: report pending changes, mutate nothing, call nothing.
    pub check: bool,
    /// Retranslate even when the staleness oracle says up to date.
    pub force: bool,
    /// Restrict the run to one target locale.
    pub lang: Option<String>,
}

/// Locales this run will visit. An unknown `--lang` is a configuration
/// failure and aborts before any work; a known locale outside the
/// simplified content set is skipped with a warning inside the loop.
fn locales_to_process(opts: &SyncOptions) -> Result<Vec<&'static Locale>> {
    match opts.lang.as_deref() {
        Some(code) => {
            let locale = find_locale(code)
                .ok_or_else(|| eyre!("unknown language: {code}"))?;
            Ok(vec![locale])
        }
        None => Ok(locales_for(LocaleSet::Simplified).collect()),
    }
}

fn in_simplified_set(locale: &Locale) -> bool {
    locales_for(LocaleSet::Simplified).any(|l| l.code == locale.code)
}

fn require_translator<'a>(
    translator: Option<&'a dyn Translator>,
) -> Result<&'a dyn Translator> {
    translator.ok_or_else(|| eyre!("translation capability required outside check mode"))
}

fn rel_display(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Whole-tree unconditional translation: every master document is
/// translated for every locale, no staleness gate, no marker.
pub fn translate_tree(
    paths: &SitePaths,
    translator: Option<&dyn Translator>,
    opts: &SyncOptions,
) -> Result<SyncReport> {
    let master_dir = paths.master_docs_dir();
    let files = list_markdown_files(&master_dir)?;
    tracing::info!(event = "translate_tree_start", files = files.len());

    let mut report = SyncReport {
        mode: SyncMode::Content.to_string(),
        check: opts.check,
        ..Default::default()
    };

    for locale in locales_to_process(opts)? {
        if !in_simplified_set(locale) {
            tracing::warn!(event = "locale_not_in_content_set", locale = locale.code);
            continue;
        }
        let mut lr = LocaleReport {
            locale: locale.code.to_string(),
            ..Default::default()
        };
        let lang_dir = paths.locale_docs_dir(locale.code);
        if !opts.check {
            mirror_directories(&master_dir, &lang_dir)?;
        }

        for file in &files {
            let rel = rel_display(&master_dir, file);
            if opts.check {
                lr.pending += 1;
                report.pending_changes.push(PendingChange {
                    locale: locale.code.to_string(),
                    unit: rel,
                    detail: "would translate".to_string(),
                });
                continue;
            }
            let translator = require_translator(translator)?;
            match std::fs::read_to_string(file).map_err(Into::into).and_then(|text| {
                translate_document(&text, locale.provider_code, translator, DocumentMode::Plain)
            }) {
                Ok(translated) => {
                    write_atomic(&lang_dir.join(&rel), &translated)?;
                    tracing::info!(event = "document_translated", locale = locale.code, path = %rel);
                    lr.translated += 1;
                }
                Err(err) => {
                    tracing::error!(event = "document_failed", locale = locale.code, path = %rel, error = %err);
                    lr.failed += 1;
                }
            }
        }
        report.locales.push(lr);
    }
    Ok(report)
}

/// Hash-gated incremental document sync. Unchanged masters are skipped
/// without touching the capability, bounding API cost on re-runs.
pub fn sync_documents(
    paths: &SitePaths,
    translator: Option<&dyn Translator>,
    opts: &SyncOptions,
) -> Result<SyncReport> {
    let master_dir = paths.master_docs_dir();
    let files = list_markdown_files(&master_dir)?;
    tracing::info!(event = "sync_documents_start", files = files.len(), check = opts.check);

    let mut report = SyncReport {
        mode: SyncMode::ContentSmart.to_string(),
        check: opts.check,
        ..Default::default()
    };

    for locale in locales_to_process(opts)? {
        if !in_simplified_set(locale) {
            tracing::warn!(event = "locale_not_in_content_set", locale = locale.code);
            continue;
        }
        let mut lr = LocaleReport {
            locale: locale.code.to_string(),
            ..Default::default()
        };
        let lang_dir = paths.locale_docs_dir(locale.code);
        if !opts.check {
            mirror_directories(&master_dir, &lang_dir)?;
        }

        for file in &files {
            let rel = rel_display(&master_dir, file);
            let target = lang_dir.join(&rel);
            let outcome: Result<()> = (|| {
                let master_text = std::fs::read_to_string(file)?;
                let staleness = needs_translation(&master_text, &target, opts.force);
                if !staleness.needed {
                    tracing::debug!(event = "document_up_to_date", locale = locale.code, path = %rel);
                    lr.up_to_date += 1;
                    return Ok(());
                }
                if opts.check {
                    lr.pending += 1;
                    report.pending_changes.push(PendingChange {
                        locale: locale.code.to_string(),
                        unit: rel.clone(),
                        detail: staleness.reason.to_string(),
                    });
                    return Ok(());
                }
                let translator = require_translator(translator)?;
                let translated = translate_document(
                    &master_text,
                    locale.provider_code,
                    translator,
                    DocumentMode::Sync,
                )?;
                write_atomic(&target, &translated)?;
                tracing::info!(
                    event = "document_synced",
                    locale = locale.code,
                    path = %rel,
                    reason = %staleness.reason,
                );
                lr.translated += 1;
                Ok(())
            })();
            if let Err(err) = outcome {
                tracing::error!(event = "document_failed", locale = locale.code, path = %rel, error = %err);
                lr.failed += 1;
            }
        }
        report.locales.push(lr);
    }
    Ok(report)
}

/// Catalog sync: reconcile each target locale's UI-string catalog against
/// the master catalog. A missing target catalog is built from scratch; a
/// malformed one is logged and rebuilt from empty.
pub fn sync_catalogs(
    paths: &SitePaths,
    translator: Option<&dyn Translator>,
    opts: &SyncOptions,
) -> Result<SyncReport> {
    let master_path = paths.master_catalog();
    if !master_path.exists() {
        bail!("master locale file not found: {}", master_path.display());
    }
    let master: Value = serde_json::from_str(&std::fs::read_to_string(&master_path)?)?;
    let Value::Object(master) = master else {
        bail!("master catalog is not a JSON object: {}", master_path.display());
    };
    tracing::info!(event = "sync_catalogs_start", keys = master.len(), check = opts.check);

    let mut report = SyncReport {
        mode: SyncMode::I18n.to_string(),
        check: opts.check,
        ..Default::default()
    };

    for locale in locales_to_process(opts)? {
        if !in_simplified_set(locale) {
            tracing::warn!(event = "locale_not_in_catalog_set", locale = locale.code);
            continue;
        }
        let mut lr = LocaleReport {
            locale: locale.code.to_string(),
            ..Default::default()
        };
        let target_path = paths.catalog_for(locale.code);
        let file_existed = target_path.exists();
        let mut target: Map<String, Value> = if file_existed {
            match std::fs::read_to_string(&target_path)
                .map_err(|e| eyre!(e))
                .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| eyre!(e)))
            {
                Ok(Value::Object(m)) => m,
                Ok(_) | Err(_) => {
                    // Structural failure: rebuild the catalog from empty.
                    tracing::warn!(event = "catalog_unparsable", locale = locale.code, path = %target_path.display());
                    Map::new()
                }
            }
        } else {
            tracing::info!(event = "catalog_will_create", locale = locale.code, path = %target_path.display());
            Map::new()
        };

        let mode = if opts.check {
            CatalogMode::Check
        } else {
            CatalogMode::Apply(require_translator(translator)?)
        };
        let outcome = merge_catalog(&master, &mut target, locale.code, &mode)?;

        if opts.check {
            lr.pending = outcome.change_count;
            if !file_existed && outcome.change_count == 0 {
                // Creating the file is itself a change a mutating run performs.
                lr.pending += 1;
            }
            if outcome.change_count > 0 || !file_existed {
                report.pending_changes.push(PendingChange {
                    locale: locale.code.to_string(),
                    unit: format!("{}.json", locale.code),
                    detail: if file_existed {
                        format!("{} change(s) needed", outcome.change_count)
                    } else {
                        "would create new file".to_string()
                    },
                });
            }
        } else if outcome.unsupported {
            // Content problem, not a transient one: drop the partial merge.
            tracing::error!(event = "catalog_merge_aborted", locale = locale.code);
            lr.failed += 1;
        } else if outcome.mutated || !file_existed {
            let mut body = serde_json::to_string_pretty(&Value::Object(target))?;
            body.push('\n');
            write_atomic(&target_path, &body)?;
            tracing::info!(
                event = "catalog_written",
                locale = locale.code,
                changes = outcome.change_count,
            );
            lr.translated = outcome.change_count;
        } else {
            tracing::info!(event = "catalog_unchanged", locale = locale.code);
            lr.up_to_date += 1;
        }
        report.locales.push(lr);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docloc_domain::StalenessReason;
    use docloc_translate::{TranslateError, TranslateOptions};
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;

    struct CountingTranslator {
        calls: RefCell<usize>,
    }

    impl CountingTranslator {
        fn new() -> Self {
            CountingTranslator { calls: RefCell::new(0) }
        }
        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl Translator for CountingTranslator {
        fn translate(
            &self,
            text: &str,
            _s: &str,
            _t: &str,
            _o: &TranslateOptions,
        ) -> std::result::Result<String, TranslateError> {
            *self.calls.borrow_mut() += 1;
            Ok(format!("[x] {text}"))
        }
    }

    fn site(dir: &Path) -> SitePaths {
        SitePaths::resolve(dir, &DoclocConfig::default())
    }

    fn seed_master_tree(root: &Path) {
        let docs = root.join("content/en/docs");
        fs::create_dir_all(docs.join("guides")).unwrap();
        fs::write(docs.join("intro.md"), "---\ntitle: Intro\n---\nWelcome here.\n").unwrap();
        fs::write(docs.join("guides/setup.md"), "Install the thing.\n").unwrap();
    }

    fn opts(check: bool) -> SyncOptions {
        SyncOptions { check, force: false, lang: Some("de".to_string()) }
    }

    #[test]
    fn incremental_sync_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());

        let first = CountingTranslator::new();
        let report = sync_documents(&paths, Some(&first), &opts(false)).unwrap();
        assert_eq!(report.total_translated(), 2);
        assert!(first.calls() > 0);

        let second = CountingTranslator::new();
        let report = sync_documents(&paths, Some(&second), &opts(false)).unwrap();
        assert_eq!(second.calls(), 0, "second run must not touch the capability");
        assert_eq!(report.total_translated(), 0);
        assert_eq!(report.locales[0].up_to_date, 2);
    }

    #[test]
    fn master_edit_triggers_exactly_that_document() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());

        let t = CountingTranslator::new();
        sync_documents(&paths, Some(&t), &opts(false)).unwrap();

        fs::write(
            dir.path().join("content/en/docs/intro.md"),
            "---\ntitle: Intro\n---\nWelcome, revised.\n",
        )
        .unwrap();

        let check = sync_documents(&paths, None, &opts(true)).unwrap();
        assert_eq!(check.total_pending(), 1);
        assert_eq!(check.pending_changes[0].unit, "intro.md");
        assert_eq!(
            check.pending_changes[0].detail,
            StalenessReason::MasterChanged.to_string()
        );
    }

    #[test]
    fn check_counts_match_what_a_mutating_run_performs() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());

        let check = sync_documents(&paths, None, &opts(true)).unwrap();
        let t = CountingTranslator::new();
        let apply = sync_documents(&paths, Some(&t), &opts(false)).unwrap();
        assert_eq!(check.total_pending(), apply.total_translated());
    }

    #[test]
    fn check_mode_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());

        sync_documents(&paths, None, &opts(true)).unwrap();
        assert!(!dir.path().join("content/de").exists());
    }

    #[test]
    fn translate_tree_writes_unmarked_documents() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());

        let t = CountingTranslator::new();
        let report = translate_tree(&paths, Some(&t), &opts(false)).unwrap();
        assert_eq!(report.total_translated(), 2);
        let out = fs::read_to_string(dir.path().join("content/de/docs/intro.md")).unwrap();
        assert!(out.contains("[x] Welcome here."));
        assert!(!out.contains("TRANSLATED"), "plain mode must not add the marker");
        // mirrored structure
        assert!(dir.path().join("content/de/docs/guides/setup.md").exists());
    }

    #[test]
    fn unknown_lang_is_fatal_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());
        let bad = SyncOptions { check: true, force: false, lang: Some("xx".to_string()) };
        assert!(sync_documents(&paths, None, &bad).is_err());
    }

    #[test]
    fn non_simplified_locale_is_skipped_with_no_report_entry() {
        let dir = tempfile::tempdir().unwrap();
        seed_master_tree(dir.path());
        let paths = site(dir.path());
        let ru = SyncOptions { check: true, force: false, lang: Some("ru".to_string()) };
        let report = sync_documents(&paths, None, &ru).unwrap();
        assert!(report.locales.is_empty());
    }

    #[test]
    fn catalog_sync_creates_missing_target_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(
            dir.path().join("i18n/en.json"),
            json!({"nav": {"docs": "Docs"}, "languages": {"de": "Deutsch"}}).to_string(),
        )
        .unwrap();
        let paths = site(dir.path());

        let t = CountingTranslator::new();
        let report = sync_catalogs(&paths, Some(&t), &opts(false)).unwrap();
        assert_eq!(report.locales[0].failed, 0);

        let written: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("i18n/de.json")).unwrap())
                .unwrap();
        assert_eq!(written["nav"]["docs"], json!("[x] Docs"));
        assert_eq!(written["languages"]["de"], json!("Deutsch"));
    }

    #[test]
    fn catalog_check_reports_pending_and_leaves_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(
            dir.path().join("i18n/en.json"),
            json!({"title": "Site"}).to_string(),
        )
        .unwrap();
        let paths = site(dir.path());

        let report = sync_catalogs(&paths, None, &opts(true)).unwrap();
        assert!(report.has_pending());
        assert!(!dir.path().join("i18n/de.json").exists());
    }

    #[test]
    fn check_counts_a_creation_even_when_no_keys_change() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        // Only the reserved registry key: zero per-key changes, but a
        // mutating run would still create de.json.
        fs::write(
            dir.path().join("i18n/en.json"),
            json!({"languages": {"de": "Deutsch"}}).to_string(),
        )
        .unwrap();
        let paths = site(dir.path());

        let report = sync_catalogs(&paths, None, &opts(true)).unwrap();
        assert!(report.has_pending());
        assert_eq!(report.locales[0].pending, 1);
        assert!(!dir.path().join("i18n/de.json").exists());
    }

    #[test]
    fn malformed_target_catalog_is_rebuilt_from_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(dir.path().join("i18n/en.json"), json!({"a": "A"}).to_string()).unwrap();
        fs::write(dir.path().join("i18n/de.json"), "{not json").unwrap();
        let paths = site(dir.path());

        let t = CountingTranslator::new();
        sync_catalogs(&paths, Some(&t), &opts(false)).unwrap();
        let written: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("i18n/de.json")).unwrap())
                .unwrap();
        assert_eq!(written["a"], json!("[x] A"));
    }

    #[test]
    fn unsupported_merge_does_not_persist_a_partial_catalog() {
        struct EmptyTranslator;
        impl Translator for EmptyTranslator {
            fn translate(
                &self,
                _text: &str,
                _s: &str,
                _t: &str,
                _o: &TranslateOptions,
            ) -> std::result::Result<String, TranslateError> {
                Ok(String::new())
            }
        }
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(dir.path().join("i18n/en.json"), json!({"a": "A"}).to_string()).unwrap();
        let paths = site(dir.path());

        let report = sync_catalogs(&paths, Some(&EmptyTranslator), &opts(false)).unwrap();
        assert_eq!(report.locales[0].failed, 1);
        assert!(!dir.path().join("i18n/de.json").exists());
    }

    #[test]
    fn catalog_sync_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(
            dir.path().join("i18n/en.json"),
            json!({"nav": {"docs": "Docs"}}).to_string(),
        )
        .unwrap();
        let paths = site(dir.path());

        let first = CountingTranslator::new();
        sync_catalogs(&paths, Some(&first), &opts(false)).unwrap();
        assert_eq!(first.calls(), 1);

        let second = CountingTranslator::new();
        let report = sync_catalogs(&paths, Some(&second), &opts(false)).unwrap();
        assert_eq!(second.calls(), 0);
        assert_eq!(report.locales[0].up_to_date, 1);
    }
}
