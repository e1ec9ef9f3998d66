//! Line classification for markdown documents. Front-matter and code-fence
//! state are order-dependent, so classification is a strict scan over lines
//! in document order; a single line cannot be judged in isolation.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Pass through unchanged, never sent to the translation capability.
    Verbatim,
    Translatable,
}

static EMPTY_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*$").unwrap());

/// State machine walked over a document's lines in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineScanner {
    in_front_matter: bool,
    front_matter_closed: bool,
    in_code_fence: bool,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, line: &str) -> LineClass {
        // Front matter opens and closes on a line that is exactly the
        // delimiter; after the closing delimiter further `---` lines are
        // ordinary thematic breaks.
        if line == "---" && !self.front_matter_closed {
            if self.in_front_matter {
                self.in_front_matter = false;
                self.front_matter_closed = true;
            } else {
                self.in_front_matter = true;
            }
            return LineClass::Verbatim;
        }
        if self.in_front_matter {
            return LineClass::Verbatim;
        }

        if line.starts_with("```") {
            self.in_code_fence = !self.in_code_fence;
            return LineClass::Verbatim;
        }
        if self.in_code_fence {
            return LineClass::Verbatim;
        }

        if is_skippable_text(line) {
            return LineClass::Verbatim;
        }
        LineClass::Translatable
    }

    /// Whether the scanner currently sits inside a stateful verbatim block
    /// (front matter or a code fence). Used by passes that must leave those
    /// regions alone but still touch lines the line-local skip rule rejects.
    pub fn in_verbatim_block(&self) -> bool {
        self.in_front_matter || self.in_code_fence
    }
}

/// The one authoritative skip rule for a line/string outside any stateful
/// region. Shared by the document scanner and the catalog-leaf path so the
/// two cannot drift apart.
pub fn is_skippable_text(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    if EMPTY_HEADING_RE.is_match(text) {
        return true;
    }
    if text.starts_with('|') || text.starts_with("```") || text.starts_with("---") {
        return true;
    }
    if text.starts_with("<!--") {
        return true;
    }
    // Link-heavy lines: anything opening with `[` that contains `](` is left
    // alone, including lines with trailing prose after the link. Observed
    // upstream behavior, kept as-is pending a product decision.
    if text.starts_with('[') && text.contains("](") {
        return true;
    }
    false
}
