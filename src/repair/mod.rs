//! The three oracle-facing repair stages: diagnose a failure, synthesize a
//! candidate patch, and apply it to an isolated copy of the target.

pub mod apply;
pub mod diagnose;
pub mod prompts;
pub mod synthesize;

pub use apply::{apply, patched_path};
pub use diagnose::diagnose;
pub use synthesize::{extract_code_block, synthesize};
