//! Internal-link rewriting across the content tree. Two target shapes:
//! Hugo `doclink` shortcodes, or language-prefixed `/<lang>/docs/` links.
//! Front matter and fenced code blocks are never touched; everything else,
//! including lines the translation pass skips, is fair game.

use crate::classify::LineScanner;
use crate::util::{list_markdown_files, write_atomic};
use docloc_core::Result;
use docloc_domain::{LinkConversion, LinkFileReport, LinkReport};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Rewrite to `{{< doclink path="…" text="…" />}}` shortcodes.
    Doclink,
    /// Rewrite to absolute `[text](/<lang>/docs/…)` links.
    Docs,
}

static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\((\.\.?/[^)]+)\)").unwrap());
static HARDCODED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(/docs/([^)]+)\)").unwrap());
static ABSOLUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(/[a-z-]+/docs/([^)]+)\)").unwrap());

/// Drop a single leading `./` or `../` segment.
fn strip_leading_rel(path: &str) -> &str {
    path.strip_prefix("../")
        .or_else(|| path.strip_prefix("./"))
        .unwrap_or(path)
}

fn doclink_path(relative: &str) -> String {
    let p = strip_leading_rel(relative).replace("../", "");
    p.trim_start_matches('/').to_string()
}

fn docs_path(relative: &str) -> String {
    let p = strip_leading_rel(relative);
    let p = p.strip_prefix("docs/").unwrap_or(p);
    p.trim_start_matches('/').replace("../", "")
}

fn shortcode(path: &str, text: &str) -> String {
    format!(r#"{{{{< doclink path="{path}" text="{text}" />}}}}"#)
}

fn apply(
    re: &Regex,
    line: &str,
    kind: &str,
    conversions: &mut Vec<LinkConversion>,
    render: impl Fn(&str, &str) -> String,
) -> String {
    re.replace_all(line, |caps: &Captures| {
        let converted = render(&caps[1], &caps[2]);
        conversions.push(LinkConversion {
            kind: kind.to_string(),
            original: caps[0].to_string(),
            converted: converted.clone(),
        });
        converted
    })
    .into_owned()
}

fn rewrite_line(line: &str, mode: LinkMode, lang: &str) -> (String, Vec<LinkConversion>) {
    let mut conversions = Vec::new();
    let rewritten = match mode {
        LinkMode::Doclink => {
            let l = apply(&RELATIVE_RE, line, "relative-to-doclink", &mut conversions, |t, p| {
                shortcode(&doclink_path(p), t)
            });
            let l = apply(&HARDCODED_RE, &l, "hardcoded-to-doclink", &mut conversions, |t, p| {
                shortcode(p, t)
            });
            apply(&ABSOLUTE_RE, &l, "absolute-to-doclink", &mut conversions, |t, p| {
                shortcode(p, t)
            })
        }
        LinkMode::Docs => {
            let l = apply(&RELATIVE_RE, line, "relative-to-docs", &mut conversions, |t, p| {
                format!("[{t}](/{lang}/docs/{})", docs_path(p))
            });
            apply(&HARDCODED_RE, &l, "hardcoded-to-docs", &mut conversions, |t, p| {
                format!("[{t}](/{lang}/docs/{p})")
            })
        }
    };
    (rewritten, conversions)
}

/// Rewrite one document. Front matter and fence state is tracked across
/// lines; lines inside those blocks (and the delimiters themselves) pass
/// through untouched.
pub fn rewrite_text(text: &str, mode: LinkMode, lang: &str) -> (String, Vec<LinkConversion>) {
    let mut scanner = LineScanner::new();
    let mut conversions = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for raw in text.split('\n') {
        let (line, cr) = match raw.strip_suffix('\r') {
            Some(stripped) => (stripped, "\r"),
            None => (raw, ""),
        };
        let was_inside = scanner.in_verbatim_block();
        scanner.classify(line);
        if was_inside || scanner.in_verbatim_block() {
            out.push(raw.to_string());
            continue;
        }
        let (rewritten, mut convs) = rewrite_line(line, mode, lang);
        if convs.is_empty() {
            out.push(raw.to_string());
        } else {
            out.push(format!("{rewritten}{cr}"));
            conversions.append(&mut convs);
        }
    }
    (out.join("\n"), conversions)
}

/// Rewrite links in every markdown file under `content_dir`. In check mode
/// nothing is written; the report lists what a mutating run would change.
pub fn rewrite_links(
    content_dir: &Path,
    mode: LinkMode,
    lang: &str,
    check: bool,
) -> Result<LinkReport> {
    let files = list_markdown_files(content_dir)?;
    tracing::info!(event = "rewrite_links_start", files = files.len(), check);

    let mut report = LinkReport::default();
    for file in &files {
        let rel = file
            .strip_prefix(content_dir)
            .unwrap_or(file)
            .to_string_lossy()
            .into_owned();
        let text = match std::fs::read_to_string(file) {
            Ok(t) => t,
            Err(err) => {
                tracing::error!(event = "link_file_unreadable", path = %rel, error = %err);
                continue;
            }
        };
        let (rewritten, conversions) = rewrite_text(&text, mode, lang);
        if conversions.is_empty() {
            continue;
        }
        if !check {
            write_atomic(file, &rewritten)?;
            tracing::info!(event = "links_rewritten", path = %rel, count = conversions.len());
        }
        report.total_conversions += conversions.len();
        report.files.push(LinkFileReport { path: rel, conversions });
    }
    Ok(report)
}
