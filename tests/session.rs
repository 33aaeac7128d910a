//! End-to-end repair sessions: real child processes (`sh` scripts in temp
//! workspaces) driven by a scripted in-memory oracle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use codemend::config::Config;
use codemend::oracle::{Oracle, OracleError};
use codemend::orchestrator::Session;
use codemend::repair;
use codemend::state::{Phase, SessionError};
use codemend::store;

/// Replays canned responses in order and counts every invocation.
struct ScriptedOracle {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn invoke(&self, _instructions: &str, _message: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(OracleError::EmptyResponse)
    }
}

/// Always unreachable, as a backend outage would be.
struct BrokenOracle;

#[async_trait]
impl Oracle for BrokenOracle {
    async fn invoke(&self, _instructions: &str, _message: &str) -> Result<String, OracleError> {
        Err(OracleError::Api {
            status: 503,
            message: "backend down".to_string(),
        })
    }
}

fn sh_config(dir: &TempDir, max_retry: u32) -> Config {
    let mut config = Config::default();
    config.workspace.path = dir.path().to_path_buf();
    config.workspace.interpreter = "sh".to_string();
    config.workspace.timeout = 10;
    config.agent.max_retry = max_retry;
    config
}

fn fenced(code: &str) -> String {
    format!("Here is the corrected program:\n```sh\n{code}\n```\n")
}

#[tokio::test]
async fn clean_first_run_makes_no_oracle_calls() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    store::write_text(&target, "echo all good\n");

    let oracle = ScriptedOracle::new(&[]);
    let config = sh_config(&dir, 5);
    let state = Session::new(&config, target, &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(state.fixed);
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.phase, Phase::Testing);
    assert_eq!(oracle.calls(), 0);
    assert!(!dir.path().join("after_debug").exists());
}

#[tokio::test]
async fn divide_by_zero_fixed_in_one_round() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    let buggy = "n=0\necho $((10 / n))\n";
    store::write_text(&target, buggy);

    let patch = "n=0\n\
if [ \"$n\" -eq 0 ]; then\n\
  echo \"guarded: divisor is zero\"\n\
else\n\
  echo $((10 / n))\n\
fi";
    let oracle = ScriptedOracle::new(&[
        "The divisor n is zero, so the arithmetic expansion fails; guard n before dividing.",
        &fenced(patch),
    ]);

    let config = sh_config(&dir, 5);
    let state = Session::new(&config, target.clone(), &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(state.fixed);
    assert_eq!(state.retry_count, 1);
    assert_eq!(state.phase, Phase::Debugging);
    assert_eq!(oracle.calls(), 2);
    assert!(state.diagnosis.contains("divisor"));
    assert_eq!(state.run_output, "guarded: divisor is zero");

    // The patch landed at the derived isolated path, verbatim.
    let expected_path = repair::patched_path(dir.path(), &target);
    assert_eq!(expected_path, dir.path().join("after_debug").join("main_fix.sh"));
    assert_eq!(state.patched_file.as_deref(), Some(expected_path.as_path()));
    assert_eq!(store::read_text(&expected_path), patch);

    // The original target is byte-for-byte untouched.
    assert_eq!(store::read_text(&target), buggy);
}

#[tokio::test]
async fn second_round_fix_succeeds() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    store::write_text(&target, "echo first bug >&2\nexit 1\n");

    let still_broken = "echo second bug >&2\nexit 1";
    let mended = "echo mended";
    let oracle = ScriptedOracle::new(&[
        "The script exits non-zero unconditionally.",
        &fenced(still_broken),
        "The replacement still exits non-zero.",
        &fenced(mended),
    ]);

    let config = sh_config(&dir, 3);
    let state = Session::new(&config, target, &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(state.fixed);
    assert_eq!(state.retry_count, 2);
    assert_eq!(oracle.calls(), 4);
    assert_eq!(state.run_output, "mended");
}

#[tokio::test]
async fn exhausts_retry_budget_and_gives_up() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    let buggy = "echo unfixable >&2\nexit 1\n";
    store::write_text(&target, buggy);

    let bad_patch_one = "echo round one >&2\nexit 1";
    let bad_patch_two = "echo round two >&2\nexit 1";
    let oracle = ScriptedOracle::new(&[
        "Round one analysis.",
        &fenced(bad_patch_one),
        "Round two analysis.",
        &fenced(bad_patch_two),
    ]);

    let config = sh_config(&dir, 2);
    let state = Session::new(&config, target.clone(), &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    // retry_count lands exactly on the budget; there is no third round.
    assert!(!state.fixed);
    assert_eq!(state.retry_count, 2);
    assert_eq!(oracle.calls(), 4);
    assert_eq!(state.error_log, "round two");

    // The last candidate is left on disk for inspection; the original is
    // untouched.
    let patched = repair::patched_path(dir.path(), &target);
    assert_eq!(store::read_text(&patched), bad_patch_two);
    assert_eq!(store::read_text(&target), buggy);
}

#[tokio::test]
async fn single_retry_budget_means_single_attempt() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    store::write_text(&target, "exit 1\n");

    let oracle = ScriptedOracle::new(&["Analysis.", &fenced("exit 1")]);
    let config = sh_config(&dir, 1);
    let state = Session::new(&config, target, &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(!state.fixed);
    assert_eq!(state.retry_count, 1);
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn oracle_outage_aborts_the_session() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    let buggy = "exit 1\n";
    store::write_text(&target, buggy);

    let config = sh_config(&dir, 5);
    let result = Session::new(&config, target.clone(), &BrokenOracle)
        .unwrap()
        .run()
        .await;

    match result {
        Err(SessionError::Oracle(OracleError::Api { status, .. })) => assert_eq!(status, 503),
        other => panic!("expected an oracle abort, got {other:?}"),
    }

    // Nothing was written and the target is untouched.
    assert!(!dir.path().join("after_debug").exists());
    assert_eq!(store::read_text(&target), buggy);
}

#[tokio::test]
async fn abort_mid_session_leaves_prior_patch_on_disk() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    store::write_text(&target, "exit 1\n");

    let bad_patch = "echo nope >&2\nexit 1";
    // Two responses only: the replan diagnosis call finds the well dry and
    // the session hard-aborts.
    let oracle = ScriptedOracle::new(&["Analysis.", &fenced(bad_patch)]);

    let config = sh_config(&dir, 3);
    let result = Session::new(&config, target.clone(), &oracle)
        .unwrap()
        .run()
        .await;

    assert!(matches!(
        result,
        Err(SessionError::Oracle(OracleError::EmptyResponse))
    ));
    assert_eq!(oracle.calls(), 3);

    let patched = repair::patched_path(dir.path(), &target);
    assert_eq!(store::read_text(&patched), bad_patch);
}

#[tokio::test]
async fn empty_candidate_still_consumes_a_retry_on_the_original() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    store::write_text(&target, "echo broken >&2\nexit 1\n");

    // Round one yields an unusable (empty) patch: application is a no-op and
    // validation re-runs the original. Round two repairs it.
    let oracle = ScriptedOracle::new(&[
        "Analysis one.",
        "",
        "Analysis two.",
        &fenced("echo recovered"),
    ]);

    let config = sh_config(&dir, 3);
    let state = Session::new(&config, target, &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(state.fixed);
    assert_eq!(state.retry_count, 2);
    assert_eq!(oracle.calls(), 4);
    assert_eq!(state.run_output, "recovered");
}

#[tokio::test]
async fn untagged_fence_degrades_but_still_repairs() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("main.sh");
    store::write_text(&target, "exit 1\n");

    let oracle = ScriptedOracle::new(&[
        "Analysis.",
        "```\necho degraded path works\n```",
    ]);

    let config = sh_config(&dir, 2);
    let state = Session::new(&config, target, &oracle)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(state.fixed);
    assert_eq!(state.retry_count, 1);
    assert_eq!(state.run_output, "degraded path works");
}
