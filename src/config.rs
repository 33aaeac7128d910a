//! Configuration for a repair session
//!
//! Loaded from a YAML file (`config.yaml` by default) with two sections:
//! `agent` selects the oracle backend and retry budget, `workspace` describes
//! where the target code lives and how to run it. Every field has a default,
//! so a missing or partial file still yields a usable config.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub workspace: WorkspaceConfig,
}

/// Oracle backend selection and retry budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// One of: openai, anthropic, deepseek, dashscope
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on debug-phase validation attempts.
    pub max_retry: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_retry: 5,
        }
    }
}

/// Where the target code lives and how to execute it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory scanned for the entry file; also the root the isolated
    /// patch directory is placed under.
    pub path: PathBuf,
    /// Preferred entry file name inside `path`.
    pub entry_file: String,
    /// Per-execution timeout in seconds.
    pub timeout: u64,
    /// Interpreter command used to run the target, e.g. `python3`.
    pub interpreter: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("workspace"),
            entry_file: "main.py".to_string(),
            timeout: 30,
            interpreter: "python3".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicitly named file must exist and parse. With no explicit path,
    /// `config.yaml` is used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    info!("no {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
