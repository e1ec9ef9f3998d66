use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Why a localized document does (or does not) need retranslation.
/// Variants are ordered by decision priority: the first matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StalenessReason {
    /// Target file does not exist.
    Missing,
    /// Force flag enabled.
    Forced,
    /// Master content changed since the recorded translation.
    MasterChanged,
    /// No translation marker found; the copy was hand-edited or predates markers.
    NoMarker,
    /// Target file could not be read.
    Unreadable,
    /// Up to date.
    UpToDate,
}

impl StalenessReason {
    pub fn needed(self) -> bool {
        !matches!(self, StalenessReason::UpToDate)
    }
}

impl std::fmt::Display for StalenessReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StalenessReason::Missing => "file does not exist",
            StalenessReason::Forced => "force flag enabled",
            StalenessReason::MasterChanged => "master content has changed",
            StalenessReason::NoMarker => "no translation marker found",
            StalenessReason::Unreadable => "target file unreadable",
            StalenessReason::UpToDate => "up to date",
        };
        f.write_str(s)
    }
}

/// One pending change discovered in check mode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PendingChange {
    pub locale: String,
    /// Relative document path or dotted catalog key path.
    pub unit: String,
    pub detail: String,
}

/// Per-locale counters for one sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LocaleReport {
    pub locale: String,
    pub translated: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Aggregate result of a sync run. In check mode `pending_changes` lists
/// what a mutating run would do and nothing on disk has been touched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncReport {
    pub schema_version: u32,
    pub mode: String,
    pub check: bool,
    pub locales: Vec<LocaleReport>,
    pub pending_changes: Vec<PendingChange>,
}

impl Default for SyncReport {
    fn default() -> Self {
        SyncReport {
            schema_version: SCHEMA_VERSION,
            mode: String::new(),
            check: false,
            locales: Vec::new(),
            pending_changes: Vec::new(),
        }
    }
}

impl SyncReport {
    pub fn total_pending(&self) -> usize {
        self.locales.iter().map(|l| l.pending).sum()
    }

    pub fn total_translated(&self) -> usize {
        self.locales.iter().map(|l| l.translated).sum()
    }

    pub fn has_pending(&self) -> bool {
        self.total_pending() > 0
    }
}

/// A single link rewrite performed (or planned) in one file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkConversion {
    pub kind: String,
    pub original: String,
    pub converted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkFileReport {
    pub path: String,
    pub conversions: Vec<LinkConversion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkReport {
    pub schema_version: u32,
    pub files: Vec<LinkFileReport>,
    pub total_conversions: usize,
}

impl Default for LinkReport {
    fn default() -> Self {
        LinkReport {
            schema_version: SCHEMA_VERSION,
            files: Vec::new(),
            total_conversions: 0,
        }
    }
}
