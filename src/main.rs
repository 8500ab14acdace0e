//! Poll monitor: one reconciliation pass over `~/.claude/outlook-polls.json`.
//!
//! Meant to be run by an external scheduler (e.g. Windows Task Scheduler every
//! 15 minutes). Exits non-zero only on a fatal error; per-poll failures are
//! logged and left for the next run.

use std::process::ExitCode;

use outlook_bridge_lib::config::load_config;
use outlook_bridge_lib::polls::{run_once, PollStore, ReconcileReport};
use outlook_bridge_lib::worker::ScriptRunner;

fn run() -> anyhow::Result<ReconcileReport> {
    let config =
        load_config().map_err(|e| anyhow::anyhow!("Failed to load poll monitor config: {e}"))?;

    let store = PollStore::new(&config.polls_file);
    let runner = ScriptRunner::from_config(&config);

    Ok(run_once(&store, &runner, config.search_limit))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== Poll Monitor Started ===");

    match run() {
        Ok(report) => {
            if report.active_polls > 0 {
                log::info!(
                    "Reconciled {} poll(s): {} new response(s), {} failure(s)",
                    report.polls.len(),
                    report.updated(),
                    report.failures()
                );
            }
            log::info!("=== Poll Monitor Finished ===");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Fatal error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
