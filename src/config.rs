//! Poll monitor configuration, read from `~/.claude/poll-monitor.json`.
//!
//! Every field has a default, so an absent file (or an empty `{}`) yields a
//! working Windows setup: `cscript.exe //NoLogo <scriptsDir>/<op>.vbs`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "POLL_MONITOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Directory holding one script per worker operation
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
    /// Program that runs a worker script
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Arguments placed before the script path
    #[serde(default = "default_interpreter_args")]
    pub interpreter_args: Vec<String>,
    /// Worker script file extension, without the dot
    #[serde(default = "default_script_extension")]
    pub script_extension: String,
    #[serde(default = "default_polls_file")]
    pub polls_file: PathBuf,
    /// Max messages requested per poll when searching for replies
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn claude_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".claude")
}

fn default_scripts_dir() -> PathBuf {
    claude_dir().join("outlook-scripts")
}

fn default_interpreter() -> String {
    "cscript.exe".to_string()
}

fn default_interpreter_args() -> Vec<String> {
    vec!["//NoLogo".to_string()]
}

fn default_script_extension() -> String {
    "vbs".to_string()
}

fn default_polls_file() -> PathBuf {
    claude_dir().join("outlook-polls.json")
}

fn default_search_limit() -> u32 {
    100
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            interpreter: default_interpreter(),
            interpreter_args: default_interpreter_args(),
            script_extension: default_script_extension(),
            polls_file: default_polls_file(),
            search_limit: default_search_limit(),
        }
    }
}

/// Get the config file path (`$POLL_MONITOR_CONFIG` or `~/.claude/poll-monitor.json`)
pub fn config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => claude_dir().join("poll-monitor.json"),
    }
}

/// Load config from the default location.
pub fn load_config() -> Result<MonitorConfig, String> {
    load_config_from(&config_path())
}

/// Load config from `path`. A missing file means defaults; a broken one is an error.
pub fn load_config_from(path: &Path) -> Result<MonitorConfig, String> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(MonitorConfig::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}
