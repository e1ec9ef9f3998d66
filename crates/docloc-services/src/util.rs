use docloc_core::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Write a file atomically: the content lands under a temporary name in the
/// same directory and is renamed over the destination, so readers never see
/// a partially written document or catalog.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp~");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// All markdown files under `root`, sorted by relative path for stable
/// processing and log order.
pub fn list_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        if p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            files.push(p.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Recreate master's directory tree under the target root. Idempotent;
/// files are not copied, only directories.
pub fn mirror_directories(source: &Path, target: &Path) -> Result<()> {
    std::fs::create_dir_all(target)?;
    for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        std::fs::create_dir_all(target.join(rel))?;
    }
    Ok(())
}
