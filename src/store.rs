//! File store: the only component that touches the filesystem on behalf of
//! the repair stages.
//!
//! Reads degrade to an empty string and writes report success as a bool;
//! neither propagates errors past this boundary. Writes are full overwrites
//! (no temp-then-rename), so a crash mid-write can leave a truncated patch
//! file behind - acceptable for a single-session tool.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::language;

/// Read a file to a string. Any failure (missing file, IO error, bad UTF-8)
/// is logged and yields an empty string.
pub fn read_text(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => {
            debug!("read {} ({} chars)", path.display(), content.len());
            content
        }
        Err(err) => {
            error!("failed to read {}: {}", path.display(), err);
            String::new()
        }
    }
}

/// Write a string to a file, creating missing parent directories. Existing
/// content is fully replaced. Returns false on failure (logged).
pub fn write_text(path: &Path, content: &str) -> bool {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent) {
                error!("failed to create {}: {}", parent.display(), err);
                return false;
            }
        }
    }

    match fs::write(path, content) {
        Ok(()) => {
            debug!("wrote {} ({} chars)", path.display(), content.len());
            true
        }
        Err(err) => {
            error!("failed to write {}: {}", path.display(), err);
            false
        }
    }
}

/// Locate the entry file inside a workspace directory.
///
/// Strategy: an exact match on `entry_name` wins; otherwise fall back to the
/// alphabetically-first file whose extension maps to a known language. An
/// empty or missing workspace yields `None`.
pub fn find_entry_file(workspace: &Path, entry_name: &str) -> Option<PathBuf> {
    if !workspace.is_dir() {
        error!("workspace directory does not exist: {}", workspace.display());
        return None;
    }

    let candidate = workspace.join(entry_name);
    if candidate.is_file() {
        return Some(candidate);
    }

    let fallback = list_source_files(workspace).into_iter().next();
    match &fallback {
        Some(path) => warn!(
            "'{}' not found, falling back to {}",
            entry_name,
            path.display()
        ),
        None => error!("no source files in {}", workspace.display()),
    }
    fallback
}

/// Top-level source files in a directory (non-recursive), sorted by name.
/// Only files with a recognized language extension are listed.
pub fn list_source_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && language::is_known_extension(p))
        .collect();
    files.sort();
    files
}
