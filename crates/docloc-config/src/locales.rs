//! The locale registry: one immutable table loaded with the process, with
//! named subset views. The full set mirrors the site's language menu; the
//! simplified subset is what content translation actually processes.

/// Master (source) language of the content tree and catalogs.
pub const MASTER_LANG: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    /// Site language tag, doubles as the per-locale directory name.
    pub code: &'static str,
    pub name: &'static str,
    /// Target-language code understood by the translation provider.
    pub provider_code: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSet {
    Full,
    Simplified,
}

static LOCALES: &[Locale] = &[
    Locale { code: "ar", name: "Arabic", provider_code: "AR" },
    Locale { code: "cs", name: "Czech", provider_code: "CS" },
    Locale { code: "de", name: "German", provider_code: "DE" },
    Locale { code: "el", name: "Greek", provider_code: "EL" },
    Locale { code: "es", name: "Spanish", provider_code: "ES" },
    Locale { code: "fr", name: "French", provider_code: "FR" },
    Locale { code: "he", name: "Hebrew", provider_code: "HE" },
    Locale { code: "hu", name: "Hungarian", provider_code: "HU" },
    Locale { code: "is", name: "Icelandic", provider_code: "IS" },
    Locale { code: "it", name: "Italian", provider_code: "IT" },
    Locale { code: "ja", name: "Japanese", provider_code: "JA" },
    Locale { code: "ko", name: "Korean", provider_code: "KO" },
    Locale { code: "nl-be", name: "Dutch (Belgium)", provider_code: "NL" },
    Locale { code: "pl", name: "Polish", provider_code: "PL" },
    Locale { code: "pt", name: "Portuguese", provider_code: "PT-PT" },
    Locale { code: "pt-br", name: "Portuguese (Brazil)", provider_code: "PT-BR" },
    Locale { code: "ro", name: "Romanian", provider_code: "RO" },
    Locale { code: "ru", name: "Russian", provider_code: "RU" },
    Locale { code: "sk", name: "Slovak", provider_code: "SK" },
    Locale { code: "sv-se", name: "Swedish (Sweden)", provider_code: "SV" },
    Locale { code: "tr", name: "Turkish", provider_code: "TR" },
    Locale { code: "uk", name: "Ukrainian", provider_code: "UK" },
    Locale { code: "zh-cn", name: "Chinese (Simplified)", provider_code: "ZH-HANS" },
    Locale { code: "zh-tw", name: "Chinese (Traditional)", provider_code: "ZH-HANT" },
];

/// Content translation only covers this subset for now.
static SIMPLIFIED_CODES: &[&str] = &["de", "es", "fr", "zh-cn"];

pub fn locales_for(set: LocaleSet) -> impl Iterator<Item = &'static Locale> {
    LOCALES.iter().filter(move |l| match set {
        LocaleSet::Full => true,
        LocaleSet::Simplified => SIMPLIFIED_CODES.contains(&l.code),
    })
}

pub fn find_locale(code: &str) -> Option<&'static Locale> {
    LOCALES.iter().find(|l| l.code == code)
}

/// Provider-code overrides used by catalog sync, where catalog file names
/// include historical aliases not present in the site language menu.
static CATALOG_OVERRIDES: &[(&str, &str)] = &[
    ("zh-cn", "ZH-HANS"),
    ("zh-tw", "ZH-HANT"),
    ("pt", "PT-PT"),
    ("pt-br", "PT-BR"),
    ("en", "EN"),
    ("en-us", "EN-US"),
    ("en-gb", "EN-GB"),
    ("sv-se", "SV"),
    ("ua", "UK"),
    ("nl-be", "NL"),
    ("is", "IS"),
    ("cz", "CS"),
    ("cs", "CS"),
    ("uk", "UK"),
];

/// Resolve the provider code for a catalog locale: override table first,
/// then the registry, then an uppercase fallback.
pub fn catalog_provider_code(code: &str) -> String {
    let lower = code.to_ascii_lowercase();
    if let Some((_, p)) = CATALOG_OVERRIDES.iter().find(|(c, _)| *c == lower) {
        return (*p).to_string();
    }
    if let Some(l) = find_locale(&lower) {
        return l.provider_code.to_string();
    }
    code.to_ascii_uppercase()
}
