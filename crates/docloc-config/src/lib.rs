use serde::Deserialize;

mod locales;

pub use locales::{
    catalog_provider_code, find_locale, locales_for, Locale, LocaleSet, MASTER_LANG,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoclocConfig {
    /// Content root relative to the site root (default "content").
    pub content_dir: Option<String>,
    /// Subdirectory under each language holding docs (default "docs").
    pub docs_subdir: Option<String>,
    /// Directory with per-locale UI-string catalogs (default "i18n").
    pub locales_dir: Option<String>,
    pub master_lang: Option<String>,
    pub translate: Option<TranslateCfg>,
    pub links: Option<LinksCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateCfg {
    /// Override the DeepL endpoint (e.g. the free-tier host).
    pub api_url: Option<String>,
    /// Pause after each capability call, in milliseconds.
    pub rate_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinksCfg {
    pub mode: Option<String>,
    pub lang: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },
}

fn load_file(path: &std::path::Path) -> Result<Option<DoclocConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = toml::from_str::<DoclocConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cfg))
}

/// Load `docloc.toml` from CWD first, then `$CONFIG_DIR/docloc/docloc.toml`.
/// Earlier files win field-by-field; a missing file is skipped, a present
/// but broken one is an error.
pub fn load_config() -> Result<DoclocConfig, ConfigError> {
    let mut merged = DoclocConfig::default();
    if let Ok(p) = std::env::current_dir() {
        if let Some(cfg) = load_file(&p.join("docloc.toml"))? {
            merged = merge(merged, cfg);
        }
    }
    if let Some(base) = dirs::config_dir() {
        if let Some(cfg) = load_file(&base.join("docloc").join("docloc.toml"))? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn merge(mut a: DoclocConfig, b: DoclocConfig) -> DoclocConfig {
    if a.content_dir.is_none() {
        a.content_dir = b.content_dir;
    }
    if a.docs_subdir.is_none() {
        a.docs_subdir = b.docs_subdir;
    }
    if a.locales_dir.is_none() {
        a.locales_dir = b.locales_dir;
    }
    if a.master_lang.is_none() {
        a.master_lang = b.master_lang;
    }
    a.translate = merge_opt(a.translate, b.translate, merge_translate);
    a.links = merge_opt(a.links, b.links, merge_links);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_translate(mut a: TranslateCfg, b: TranslateCfg) -> TranslateCfg {
    if a.api_url.is_none() {
        a.api_url = b.api_url;
    }
    if a.rate_delay_ms.is_none() {
        a.rate_delay_ms = b.rate_delay_ms;
    }
    a
}

fn merge_links(mut a: LinksCfg, b: LinksCfg) -> LinksCfg {
    if a.mode.is_none() {
        a.mode = b.mode;
    }
    if a.lang.is_none() {
        a.lang = b.lang;
    }
    a
}
