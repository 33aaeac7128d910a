//! Execution sandbox: run a target source file as a child process with a
//! timeout, capturing its output.
//!
//! Every failure mode (missing file, spawn error, timeout, non-zero exit)
//! comes back as `succeeded = false` with a diagnostic in `stderr`; nothing
//! at this layer panics or retries. Timed-out children are killed and reaped
//! before control returns.

use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of a single child-process run. Produced and consumed within one
/// orchestrator transition; never retained beyond it.
#[derive(Debug)]
pub struct ExecutionResult {
    /// True iff the child exited with status 0.
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    fn failure(message: String) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: message,
        }
    }
}

/// Run `<interpreter> <file_path>` with the file's containing directory as
/// the working directory, so relative imports and data paths resolve.
pub fn execute(file_path: &Path, timeout: Duration, interpreter: &str) -> ExecutionResult {
    if !file_path.is_file() {
        let msg = format!("file does not exist: {}", file_path.display());
        warn!("{msg}");
        return ExecutionResult::failure(msg);
    }

    let work_dir = file_path.parent().unwrap_or_else(|| Path::new("."));
    info!(
        "executing: {} {}",
        interpreter,
        file_path.file_name().unwrap_or_default().to_string_lossy()
    );

    let mut child = match Command::new(interpreter)
        .arg(file_path)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            let msg = format!("failed to start '{}': {}", interpreter, err);
            warn!("{msg}");
            return ExecutionResult::failure(msg);
        }
    };

    // Drain the pipes on background threads so a chatty child can't fill a
    // pipe buffer and deadlock against our wait loop.
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_handle = thread::spawn(move || drain(stdout_pipe));
    let stderr_handle = thread::spawn(move || drain(stderr_pipe));

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // The drain threads are not joined here: a surviving
                    // grandchild can hold the pipe open past the deadline,
                    // and the captured output is discarded anyway.
                    let msg = format!("execution timed out (>{}s)", timeout.as_secs());
                    warn!("{msg}");
                    return ExecutionResult::failure(msg);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                let msg = format!("failed to wait for child: {}", err);
                warn!("{msg}");
                return ExecutionResult::failure(msg);
            }
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    let stdout = String::from_utf8_lossy(&stdout_bytes).trim().to_string();
    let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_string();
    let succeeded = status.map(|s| s.success()).unwrap_or(false);

    if succeeded {
        info!("execution succeeded");
    } else {
        warn!(
            "execution failed (exit {:?})",
            status.and_then(|s| s.code())
        );
    }

    ExecutionResult {
        succeeded,
        stdout,
        stderr,
    }
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        let _ = BufReader::new(pipe).read_to_end(&mut buf);
    }
    buf
}
