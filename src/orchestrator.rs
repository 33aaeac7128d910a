//! The repair state machine
//!
//! One session drives one target file through:
//!
//! ```text
//!   Entry ──► Test ──► Solve ──► done (fixed on first run)
//!                        │
//!                        ▼
//!                      Debug ──► Plan ──► Execute ──► Solve
//!                        ▲                              │
//!                        └───────── replan ◄────────────┘
//!                               (retry_count < max_retry)
//! ```
//!
//! Test runs the original target once and never consumes a retry. Solve is a
//! pure routing gate while the phase is `Testing`; once the phase is
//! `Debugging` it re-executes the current candidate, consumes exactly one
//! retry per visit, and decides between success, replan and giving up. The
//! phase flips to `Debugging` in Debug and never flips back.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::exec::{self, ExecutionResult};
use crate::language;
use crate::oracle::Oracle;
use crate::repair;
use crate::state::{Phase, RunState, SessionError};
use crate::store;

/// Named states of the loop. Terminal success and failure are expressed by
/// returning from `run` rather than by variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Entry,
    Test,
    Solve,
    Debug,
    Plan,
    Execute,
}

/// One end-to-end repair attempt against one target file.
pub struct Session<'a> {
    oracle: &'a dyn Oracle,
    timeout: Duration,
    interpreter: String,
    state: RunState,
}

impl<'a> Session<'a> {
    /// Prepare a session. A missing target is fatal here, before anything
    /// runs - it is not a repairable failure.
    pub fn new(
        config: &Config,
        target_file: PathBuf,
        oracle: &'a dyn Oracle,
    ) -> Result<Self, SessionError> {
        if !target_file.is_file() {
            return Err(SessionError::MissingTarget(target_file));
        }

        let lang = language::from_path(&target_file);
        info!(
            "session start: target={} language={} max_retry={}",
            target_file.display(),
            lang.name,
            config.agent.max_retry
        );

        let state = RunState::new(
            config.workspace.path.clone(),
            target_file,
            lang,
            config.agent.max_retry,
        );

        Ok(Self {
            oracle,
            timeout: Duration::from_secs(config.workspace.timeout),
            interpreter: config.workspace.interpreter.clone(),
            state,
        })
    }

    /// Drive the machine to a terminal state.
    ///
    /// `Ok` carries the terminal `RunState` for both ordinary outcomes -
    /// `fixed == true` (repaired, or never broken) and `fixed == false`
    /// (retry budget exhausted). `Err` is a hard abort: the oracle failed
    /// mid-session. Whatever patch was applied before the abort stays on
    /// disk.
    pub async fn run(mut self) -> Result<RunState, SessionError> {
        let mut step = Step::Entry;
        loop {
            step = match step {
                Step::Entry => Step::Test,
                Step::Test => self.test(),
                Step::Solve => match self.solve() {
                    Some(next) => next,
                    None => return Ok(self.state),
                },
                Step::Debug => self.debug().await?,
                Step::Plan => self.plan().await?,
                Step::Execute => self.execute_patch(),
            };
        }
    }

    /// Run the original target. Caches the source text on the first (and
    /// only) visit; never touches the retry counter.
    fn test(&mut self) -> Step {
        if self.state.source_text.is_empty() {
            self.state.source_text = store::read_text(&self.state.target_file);
        }

        let result = exec::execute(&self.state.target_file, self.timeout, &self.interpreter);
        self.record(result);
        Step::Solve
    }

    /// Route on the last execution result. Returns `None` on a terminal
    /// state.
    ///
    /// From the testing phase this inspects flags only - the execution
    /// already happened in Test. From the debugging phase it validates the
    /// current candidate with a fresh execution first, consuming a retry.
    fn solve(&mut self) -> Option<Step> {
        match self.state.phase {
            Phase::Testing => {
                if self.state.fixed {
                    info!("initial run succeeded, nothing to repair");
                    None
                } else {
                    info!("initial run failed, entering debug loop");
                    Some(Step::Debug)
                }
            }
            Phase::Debugging => {
                let candidate = self
                    .state
                    .patched_file
                    .clone()
                    .unwrap_or_else(|| self.state.target_file.clone());
                info!(
                    "validating {} (attempt {}/{})",
                    candidate.display(),
                    self.state.retry_count + 1,
                    self.state.max_retry
                );

                let result = exec::execute(&candidate, self.timeout, &self.interpreter);
                self.state.retry_count += 1;
                self.record(result);
                // Re-read from disk so the next prompt sees exactly what ran.
                self.state.source_text = store::read_text(&candidate);

                if self.state.fixed {
                    info!("validation passed on retry {}", self.state.retry_count);
                    None
                } else if self.state.retry_count < self.state.max_retry {
                    warn!(
                        "validation failed, replanning ({}/{})",
                        self.state.retry_count, self.state.max_retry
                    );
                    // Replan with a fresh diagnosis of the new failure; the
                    // phase stays Debugging.
                    Some(Step::Debug)
                } else {
                    error!("retry budget exhausted ({})", self.state.max_retry);
                    None
                }
            }
        }
    }

    /// Flip into the debugging phase and fetch a root-cause diagnosis.
    async fn debug(&mut self) -> Result<Step, SessionError> {
        self.state.phase = Phase::Debugging;
        self.state.diagnosis = repair::diagnose(
            self.oracle,
            &self.state.source_text,
            &self.state.error_log,
            &self.state.language,
        )
        .await?;
        Ok(Step::Plan)
    }

    /// Fetch a candidate patch for the current failure.
    async fn plan(&mut self) -> Result<Step, SessionError> {
        self.state.patch = repair::synthesize(
            self.oracle,
            &self.state.source_text,
            &self.state.error_log,
            &self.state.diagnosis,
            &self.state.language,
        )
        .await?;
        Ok(Step::Execute)
    }

    /// Write the candidate to its isolated path. An unusable candidate is a
    /// no-op: validation then re-runs whatever the current target is, and
    /// the failure is surfaced (and billed to the budget) there.
    fn execute_patch(&mut self) -> Step {
        if let Some(path) = repair::apply(
            &self.state.patch,
            &self.state.target_file,
            &self.state.workspace_root,
        ) {
            self.state.source_text = self.state.patch.clone();
            self.state.patched_file = Some(path);
        }
        Step::Solve
    }

    fn record(&mut self, result: ExecutionResult) {
        self.state.fixed = result.succeeded;
        self.state.run_output = result.stdout;
        self.state.error_log = result.stderr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// An oracle that must never be consulted.
    struct UnreachableOracle;

    #[async_trait]
    impl Oracle for UnreachableOracle {
        async fn invoke(&self, _: &str, _: &str) -> Result<String, OracleError> {
            panic!("oracle must not be called for a passing target");
        }
    }

    fn sh_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.workspace.path = dir.path().to_path_buf();
        config.workspace.interpreter = "sh".to_string();
        config.workspace.timeout = 10;
        config
    }

    #[test]
    fn test_missing_target_is_fatal_at_startup() {
        let dir = TempDir::new().unwrap();
        let config = sh_config(&dir);
        let missing = dir.path().join("ghost.sh");

        match Session::new(&config, missing.clone(), &UnreachableOracle) {
            Err(SessionError::MissingTarget(path)) => assert_eq!(path, missing),
            _ => panic!("expected MissingTarget"),
        }
    }

    #[tokio::test]
    async fn test_clean_target_never_consults_oracle() {
        let dir = TempDir::new().unwrap();
        let config = sh_config(&dir);
        let target = dir.path().join("ok.sh");
        store::write_text(&target, "echo all good\n");

        let session = Session::new(&config, target, &UnreachableOracle).unwrap();
        let state = session.run().await.unwrap();

        assert!(state.fixed);
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.phase, Phase::Testing);
        assert_eq!(state.run_output, "all good");
        assert!(state.patched_file.is_none());
    }
}
