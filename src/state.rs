//! The mutable record threaded through one repair session, plus the
//! session-level failure classification.

use std::path::PathBuf;

use thiserror::Error;

use crate::language::Language;
use crate::oracle::OracleError;

/// Which branch of the loop the session is in. Flips from `Testing` to
/// `Debugging` on the first failed run and never flips back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial probe of the original target; no retry has been consumed.
    Testing,
    /// Diagnose/patch/validate cycling; every validation consumes a retry.
    Debugging,
}

/// State owned by a single session. Created once at session start and
/// returned, in its terminal shape, when the orchestrator stops.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Root under which the isolated patch directory is created.
    pub workspace_root: PathBuf,
    /// The original target. Read, executed, never written.
    pub target_file: PathBuf,
    /// Isolated copy carrying the latest accepted patch, once one exists.
    pub patched_file: Option<PathBuf>,
    /// Source text of whatever file was most recently executed.
    pub source_text: String,
    pub language: Language,
    /// stdout of the most recent execution, trimmed.
    pub run_output: String,
    /// stderr of the most recent execution, trimmed.
    pub error_log: String,
    /// Latest root-cause analysis from the oracle.
    pub diagnosis: String,
    /// Latest candidate patch extracted from the oracle.
    pub patch: String,
    /// Debug-phase validation attempts consumed so far.
    pub retry_count: u32,
    pub max_retry: u32,
    /// True once an execution exits 0.
    pub fixed: bool,
    pub phase: Phase,
}

impl RunState {
    pub fn new(
        workspace_root: PathBuf,
        target_file: PathBuf,
        language: Language,
        max_retry: u32,
    ) -> Self {
        Self {
            workspace_root,
            target_file,
            patched_file: None,
            source_text: String::new(),
            language,
            run_output: String::new(),
            error_log: String::new(),
            diagnosis: String::new(),
            patch: String::new(),
            retry_count: 0,
            max_retry,
            fixed: false,
            phase: Phase::Testing,
        }
    }
}

/// A hard abort, as opposed to the ordinary exhausted-retries outcome
/// (which is an `Ok` terminal state with `fixed = false`).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The target (or the workspace meant to contain it) is absent at
    /// startup. Nothing was executed, no retry was consumed.
    #[error("target file not found: {0}")]
    MissingTarget(PathBuf),

    /// A diagnosis or synthesis call failed. The session stops where it
    /// stands; any previously applied patch stays on disk.
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),
}
