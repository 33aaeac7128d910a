use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use codemend::config::Config;
use codemend::oracle;
use codemend::orchestrator::Session;
use codemend::store;

#[derive(Parser, Debug)]
#[command(
    name = "codemend",
    about = "Detects and repairs failing scripts with an LLM oracle",
    version
)]
struct Args {
    /// Target source file to repair (defaults to the workspace entry file)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to config.yaml (defaults to ./config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            // Hard aborts: missing target/workspace, oracle construction or
            // mid-session oracle failure, unreadable config. Distinct from
            // the exhausted-retries exit below.
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = Config::load(args.config.as_deref())?;

    let target = match args.file {
        Some(file) => file,
        None => store::find_entry_file(&config.workspace.path, &config.workspace.entry_file)
            .with_context(|| {
                format!(
                    "no target file found in workspace {}",
                    config.workspace.path.display()
                )
            })?,
    };

    let oracle = oracle::build(&config.agent)?;
    let session = Session::new(&config, target, oracle.as_ref())?;
    let state = session.run().await.context("session aborted")?;

    if state.fixed {
        info!("repair succeeded (retries used: {})", state.retry_count);
        if !state.run_output.is_empty() {
            info!("program output:\n{}", state.run_output);
        }
        if let Some(patched) = &state.patched_file {
            info!("repaired copy: {}", patched.display());
        }
        Ok(ExitCode::SUCCESS)
    } else {
        error!("repair failed after {} retries", state.retry_count);
        if !state.error_log.is_empty() {
            error!("last error:\n{}", state.error_log);
        }
        Ok(ExitCode::from(1))
    }
}
