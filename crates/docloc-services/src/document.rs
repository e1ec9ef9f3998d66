//! Document translator: turns one master markdown document into one
//! localized document, line by line, preserving structure. Verbatim lines
//! (front matter, fences, tables, link lines) are copied unchanged; a
//! failed capability call falls back to the source text for that line only.

use crate::classify::{LineClass, LineScanner};
use crate::placeholder::{shield, unshield, SHIELD_TAG};
use crate::stale::{content_digest, marker_for};
use docloc_core::Result;
use docloc_translate::{TranslateError, TranslateOptions, Translator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentMode {
    /// Plain one-shot translation; no staleness tracking, no marker.
    Plain,
    /// Incremental sync; the output carries the translation marker with the
    /// master digest so later runs can prove it current.
    Sync,
}

/// Translate one unit of text, shielding placeholders around the capability
/// call. Shared by the document and catalog paths.
pub(crate) fn translate_unit(
    translator: &dyn Translator,
    text: &str,
    target_code: &str,
) -> std::result::Result<String, TranslateError> {
    let shielded = shield(text);
    let options = if shielded.had_placeholders {
        TranslateOptions::xml_ignoring(SHIELD_TAG)
    } else {
        TranslateOptions::default()
    };
    let translated = translator.translate(
        &shielded.payload,
        docloc_config::MASTER_LANG,
        target_code,
        &options,
    )?;
    Ok(if shielded.had_placeholders {
        unshield(&translated)
    } else {
        translated
    })
}

/// Translate a whole document. Splitting on `\n` keeps any CR bytes inside
/// the line slices, so the original line-ending convention survives rejoin.
pub fn translate_document(
    master_text: &str,
    target_code: &str,
    translator: &dyn Translator,
    mode: DocumentMode,
) -> Result<String> {
    let mut scanner = LineScanner::new();
    let mut out: Vec<String> = Vec::new();

    for raw in master_text.split('\n') {
        // Classify and translate the logical line; the CR byte of a CRLF
        // ending is restored afterwards so the convention is preserved.
        let (line, cr) = match raw.strip_suffix('\r') {
            Some(stripped) => (stripped, "\r"),
            None => (raw, ""),
        };
        match scanner.classify(line) {
            LineClass::Verbatim => out.push(raw.to_string()),
            LineClass::Translatable => match translate_unit(translator, line, target_code) {
                Ok(translated) => out.push(format!("{translated}{cr}")),
                Err(err) => {
                    // Failure is localized to this line; the document goes on.
                    tracing::warn!(
                        event = "line_translation_failed",
                        target = target_code,
                        error = %err,
                        line = %line.chars().take(50).collect::<String>(),
                    );
                    out.push(raw.to_string());
                }
            },
        }
    }

    let body = out.join("\n");
    Ok(match mode {
        DocumentMode::Plain => body,
        DocumentMode::Sync => format!(
            "{}\n\n{}",
            body,
            marker_for(&content_digest(master_text))
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stale::MARKER_PREFIX;
    use std::cell::RefCell;

    /// Uppercases translatable payloads; counts calls; optionally fails on a
    /// matching needle to exercise the per-line fallback.
    struct StubTranslator {
        calls: RefCell<usize>,
        fail_on: Option<&'static str>,
    }

    impl StubTranslator {
        fn new() -> Self {
            StubTranslator { calls: RefCell::new(0), fail_on: None }
        }
        fn failing_on(needle: &'static str) -> Self {
            StubTranslator { calls: RefCell::new(0), fail_on: Some(needle) }
        }
    }

    impl Translator for StubTranslator {
        fn translate(
            &self,
            text: &str,
            _source: &str,
            _target: &str,
            _options: &TranslateOptions,
        ) -> std::result::Result<String, TranslateError> {
            *self.calls.borrow_mut() += 1;
            if let Some(needle) = self.fail_on {
                if text.contains(needle) {
                    return Err(TranslateError::Api { status: 456, body: "quota".into() });
                }
            }
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn verbatim_lines_never_reach_the_capability() {
        let doc = "---\ntitle: x\n---\nHello world.\n```\ncode here\n```\n| a | b |";
        let stub = StubTranslator::new();
        let out = translate_document(doc, "DE", &stub, DocumentMode::Plain).unwrap();
        assert_eq!(*stub.calls.borrow(), 1);
        assert!(out.contains("HELLO WORLD."));
        assert!(out.contains("title: x"));
        assert!(out.contains("code here"));
        assert!(out.contains("| a | b |"));
    }

    #[test]
    fn sync_mode_appends_marker_with_master_digest() {
        let doc = "Hello.";
        let stub = StubTranslator::new();
        let out = translate_document(doc, "DE", &stub, DocumentMode::Sync).unwrap();
        assert!(out.contains(MARKER_PREFIX));
        assert!(out.contains(&content_digest(doc)));
    }

    #[test]
    fn plain_mode_omits_marker() {
        let stub = StubTranslator::new();
        let out = translate_document("Hello.", "DE", &stub, DocumentMode::Plain).unwrap();
        assert!(!out.contains(MARKER_PREFIX));
    }

    #[test]
    fn failed_line_falls_back_to_source_without_aborting() {
        let doc = "First line works.\nSecond line explodes.\nThird line works.";
        let stub = StubTranslator::failing_on("explodes");
        let out = translate_document(doc, "DE", &stub, DocumentMode::Plain).unwrap();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[0], "FIRST LINE WORKS.");
        assert_eq!(lines[1], "Second line explodes.");
        assert_eq!(lines[2], "THIRD LINE WORKS.");
    }

    #[test]
    fn placeholders_survive_translation_verbatim() {
        struct Reorderer;
        impl Translator for Reorderer {
            fn translate(
                &self,
                text: &str,
                _s: &str,
                _t: &str,
                _o: &TranslateOptions,
            ) -> std::result::Result<String, TranslateError> {
                // Simulate a locale that reorders clauses around the tag.
                Ok(format!("¡Bienvenido! {}", text.replace("Hello ", "").replace(", welcome!", "")))
            }
        }
        let out = translate_document(
            "Hello {user}, welcome!",
            "ES",
            &Reorderer,
            DocumentMode::Plain,
        )
        .unwrap();
        assert!(out.contains("{user}"), "placeholder mangled: {out}");
    }

    #[test]
    fn crlf_line_endings_survive_the_round_trip() {
        let doc = "---\r\nt: x\r\n---\r\nHello.\r\n";
        let stub = StubTranslator::new();
        let out = translate_document(doc, "DE", &stub, DocumentMode::Plain).unwrap();
        assert!(out.starts_with("---\r\nt: x\r\n---\r\n"));
    }
}
