//! Worker process invocation.
//!
//! Runs one worker script per call with a plain argument vector (no shell),
//! so parameter values never pass through a quoting layer. The free-text
//! `body` parameter is written to a private temp file and handed over as
//! `/bodyFile:<path>`; the file is removed when the invocation is dropped,
//! whichever way the call ends. Every other value, line breaks included, is
//! passed inline as a single argument.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::NamedTempFile;

use super::{parse_output, Worker, WorkerOp, WorkerParams};
use crate::config::MonitorConfig;
use crate::error::WorkerError;

/// Parameter that is always transported through a temp file
pub const BODY_PARAM: &str = "body";
/// Reserved flag naming the staged body file
pub const BODY_FILE_FLAG: &str = "bodyFile";

/// Runs worker scripts through an interpreter (`cscript.exe` by default).
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    interpreter_args: Vec<String>,
    scripts_dir: PathBuf,
    script_extension: String,
}

/// Fully marshalled command line plus the staged body file, if any.
///
/// Holding the `NamedTempFile` here ties the file's lifetime to the
/// invocation; dropping this struct deletes it.
struct Invocation {
    args: Vec<OsString>,
    _body_file: Option<NamedTempFile>,
}

impl ScriptRunner {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        let defaults = MonitorConfig::default();
        Self {
            interpreter: defaults.interpreter,
            interpreter_args: defaults.interpreter_args,
            scripts_dir: scripts_dir.into(),
            script_extension: defaults.script_extension,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            interpreter_args: config.interpreter_args.clone(),
            scripts_dir: config.scripts_dir.clone(),
            script_extension: config.script_extension.clone(),
        }
    }

    pub fn with_interpreter(mut self, program: &str, args: &[&str]) -> Self {
        self.interpreter = program.to_string();
        self.interpreter_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.script_extension = extension.to_string();
        self
    }

    /// Where the script for `op` is expected on disk
    pub fn script_path(&self, op: WorkerOp) -> PathBuf {
        self.scripts_dir
            .join(format!("{}.{}", op.as_str(), self.script_extension))
    }

    fn build_invocation(
        &self,
        script: &Path,
        params: &WorkerParams,
    ) -> Result<Invocation, WorkerError> {
        let mut args: Vec<OsString> = self.interpreter_args.iter().map(OsString::from).collect();
        args.push(script.as_os_str().to_owned());

        let mut body_file = None;

        for (name, value) in params.iter() {
            if !value.is_present() {
                continue;
            }

            match (name, value.render()) {
                (BODY_PARAM, Some(text)) => {
                    let file = stage_body(&text)?;
                    let mut arg = OsString::from(format!("/{}:", BODY_FILE_FLAG));
                    arg.push(file.path());
                    args.push(arg);
                    body_file = Some(file);
                }
                (_, Some(text)) => args.push(OsString::from(format!("/{}:{}", name, text))),
                (_, None) => args.push(OsString::from(format!("/{}", name))),
            }
        }

        Ok(Invocation {
            args,
            _body_file: body_file,
        })
    }
}

/// Write `text` to a fresh, exclusively created temp file.
fn stage_body(text: &str) -> Result<NamedTempFile, WorkerError> {
    let staging_err = |source: std::io::Error| WorkerError::Staging {
        name: BODY_PARAM.to_string(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix("mcp_body_")
        .suffix(".txt")
        .tempfile()
        .map_err(staging_err)?;
    file.write_all(text.as_bytes()).map_err(staging_err)?;
    file.flush().map_err(staging_err)?;
    Ok(file)
}

impl Worker for ScriptRunner {
    fn invoke(&self, op: WorkerOp, params: &WorkerParams) -> Result<Value, WorkerError> {
        let script = self.script_path(op);
        if !script.exists() {
            return Err(WorkerError::ScriptNotFound(script));
        }

        let invocation = self.build_invocation(&script, params)?;
        log::debug!(
            "Running worker {} with {} argument(s)",
            op,
            invocation.args.len()
        );

        let mut cmd = Command::new(&self.interpreter);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let output = cmd.output().map_err(|source| WorkerError::Spawn {
            worker: op.to_string(),
            source,
        })?;

        // Child has exited; release the staged body before classifying.
        drop(invocation);

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let result = parse_output(&stdout, &stderr, output.status.code()).into_result();
        if let Err(ref e) = result {
            log::debug!("Worker {} failed: {}", op, e);
        }
        result
    }
}
