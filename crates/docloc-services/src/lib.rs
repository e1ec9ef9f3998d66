//! High-level sync engine over the lower-level crates.
//! Exposes stable entrypoints used by the CLI without leaking internals.

pub mod catalog;
pub mod classify;
pub mod document;
pub mod links;
pub mod placeholder;
pub mod stale;
pub mod sync;
pub mod util;

pub use docloc_core::Result;

pub use catalog::{merge_catalog, CatalogMode, MergeOutcome};
pub use classify::{is_skippable_text, LineClass, LineScanner};
pub use document::{translate_document, DocumentMode};
pub use links::{rewrite_links, LinkMode};
pub use placeholder::{shield, unshield};
pub use stale::{content_digest, needs_translation, Staleness};
pub use sync::{sync_catalogs, sync_documents, translate_tree, SitePaths, SyncOptions};
