use serde::{Deserialize, Serialize};

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Invocation mode for the synchronizer. The three modes are selectable per
/// run and never combined: an unconditional whole-tree pass, the hash-gated
/// incremental document sync, and the UI-string catalog sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    Content,
    ContentSmart,
    I18n,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Content => write!(f, "content"),
            SyncMode::ContentSmart => write!(f, "content-smart"),
            SyncMode::I18n => write!(f, "i18n"),
        }
    }
}