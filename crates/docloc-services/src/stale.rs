//! Staleness oracle: decides whether a localized document must be
//! (re)translated without ever touching the translation capability. The
//! trailing marker records the digest of the master revision the copy was
//! produced from, so unchanged masters cost nothing on re-runs.

use docloc_domain::StalenessReason;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix of the trailing sentinel annotation. A full marker looks like
/// `<!-- TRANSLATED sha256:0123… -->`.
pub const MARKER_PREFIX: &str = "<!-- TRANSLATED";

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!-- TRANSLATED sha256:([0-9a-f]{64}) -->").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staleness {
    pub needed: bool,
    pub reason: StalenessReason,
}

impl Staleness {
    fn from(reason: StalenessReason) -> Self {
        Staleness {
            needed: reason.needed(),
            reason,
        }
    }
}

/// Deterministic digest over the full raw text. The exact algorithm is not
/// load-bearing, only determinism and collision resistance for text diffing.
pub fn content_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render the sentinel for a master revision.
pub fn marker_for(master_digest: &str) -> String {
    format!("<!-- TRANSLATED sha256:{master_digest} -->")
}

fn recorded_digest(target_text: &str) -> Option<&str> {
    MARKER_RE
        .captures(target_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decision order, first match wins: missing target, force flag, master
/// digest differs from the one recorded in the marker, marker absent,
/// otherwise up to date.
pub fn needs_translation(master_text: &str, target_path: &Path, force: bool) -> Staleness {
    if !target_path.exists() {
        return Staleness::from(StalenessReason::Missing);
    }
    if force {
        return Staleness::from(StalenessReason::Forced);
    }
    let target_text = match std::fs::read_to_string(target_path) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(event = "stale_check_read_failed", path = %target_path.display(), error = %err);
            return Staleness::from(StalenessReason::Unreadable);
        }
    };
    if !target_text.contains(MARKER_PREFIX) {
        return Staleness::from(StalenessReason::NoMarker);
    }
    let master_digest = content_digest(master_text);
    match recorded_digest(&target_text) {
        Some(d) if d == master_digest => Staleness::from(StalenessReason::UpToDate),
        // A bare or foreign marker counts as a master change: we cannot
        // prove the copy matches the current master revision.
        _ => Staleness::from(StalenessReason::MasterChanged),
    }
}
