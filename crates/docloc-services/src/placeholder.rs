//! Shield `{placeholder}` spans from the translation capability. Shielded
//! spans are wrapped in `<ph>` tags the provider is told to ignore, then
//! stripped afterwards so the original placeholder text survives
//! byte-for-byte even when the translation reorders the sentence.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tag name passed to the capability via `ignore_tags`.
pub const SHIELD_TAG: &str = "ph";

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\{[^}]+\})").unwrap());
static SHIELDED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<ph>\s*(\{[^}]+\})\s*</ph>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shielded {
    pub payload: String,
    pub had_placeholders: bool,
}

pub fn shield(text: &str) -> Shielded {
    if !PLACEHOLDER_RE.is_match(text) {
        return Shielded {
            payload: text.to_string(),
            had_placeholders: false,
        };
    }
    Shielded {
        payload: PLACEHOLDER_RE.replace_all(text, "<ph>$1</ph>").into_owned(),
        had_placeholders: true,
    }
}

pub fn unshield(translated: &str) -> String {
    SHIELDED_RE.replace_all(translated, "$1").into_owned()
}
