//! Patch application stage: write a candidate patch to a deterministic
//! isolated path. The original target is never opened for writing by
//! anything in this crate.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::store;

/// Subdirectory, under the workspace root, holding patched copies.
pub const PATCH_DIR_NAME: &str = "after_debug";
/// Token appended to the original's file stem.
pub const PATCH_SUFFIX: &str = "_fix";

/// Isolated destination for a patch of `original`:
/// `<workspace_root>/after_debug/<stem>_fix<ext>`. Deterministic, so one
/// session always validates the same file; two concurrent sessions against
/// the same target would race here, which is out of scope by design.
pub fn patched_path(workspace_root: &Path, original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("patched");
    let ext = original
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    workspace_root
        .join(PATCH_DIR_NAME)
        .join(format!("{stem}{PATCH_SUFFIX}{ext}"))
}

/// Write `candidate` to the isolated path for `original`. Returns the
/// written path, or `None` (logged, not raised) when the candidate is empty
/// or the write fails.
pub fn apply(candidate: &str, original: &Path, workspace_root: &Path) -> Option<PathBuf> {
    if candidate.trim().is_empty() {
        warn!("empty patch candidate, skipping write");
        return None;
    }

    let destination = patched_path(workspace_root, original);
    if store::write_text(&destination, candidate) {
        info!(
            "patch written to {} (original untouched: {})",
            destination.display(),
            original.display()
        );
        Some(destination)
    } else {
        warn!("failed to write patch to {}", destination.display());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_patched_path_derivation() {
        let path = patched_path(Path::new("/ws"), Path::new("/ws/main.py"));
        assert_eq!(path, PathBuf::from("/ws/after_debug/main_fix.py"));

        let path = patched_path(Path::new("/ws"), Path::new("/ws/Server.java"));
        assert_eq!(path, PathBuf::from("/ws/after_debug/Server_fix.java"));
    }

    #[test]
    fn test_patched_path_without_extension() {
        let path = patched_path(Path::new("/ws"), Path::new("/ws/script"));
        assert_eq!(path, PathBuf::from("/ws/after_debug/script_fix"));
    }

    #[test]
    fn test_apply_writes_isolated_copy() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("main.py");
        store::write_text(&original, "broken\n");

        let written = apply("fixed\n", &original, dir.path()).unwrap();
        assert_eq!(written, dir.path().join("after_debug").join("main_fix.py"));
        assert_eq!(store::read_text(&written), "fixed\n");
        // the original is left alone
        assert_eq!(store::read_text(&original), "broken\n");
    }

    #[test]
    fn test_apply_empty_candidate_is_noop() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("main.py");

        assert!(apply("", &original, dir.path()).is_none());
        assert!(apply("   \n", &original, dir.path()).is_none());
        assert!(!dir.path().join(PATCH_DIR_NAME).exists());
    }
}
