//! Out-of-band test runner.
//!
//! Repeats automations until a success count is reached, or drives a spawned
//! server end to end, and writes Markdown reports under `reports/`.

mod global;
mod report;

use crate::automations::Registry;
use crate::clock;
use crate::config::AppConfig;
use crate::model::{AutomationId, AutomationInput, Persistence};
use anyhow::{Context, Result};
use report::{Attempt, SuiteReport};
use std::path::{Path, PathBuf};

pub use global::{run_global, GlobalOptions};

/// Result of one per-automation suite.
#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub automation: AutomationId,
    pub successes: usize,
    pub attempts: usize,
    pub failed: bool,
    pub report_path: PathBuf,
}

/// Invoke `id` until `times` successes or the first failure, then write its report.
pub fn run_automation_suite(
    registry: &Registry,
    id: AutomationId,
    times: usize,
    reports_dir: &Path,
) -> Result<SuiteOutcome> {
    let mut attempts = Vec::new();
    let mut successes = 0;
    let mut failed = false;

    while successes < times && !failed {
        let number = attempts.len() + 1;
        match registry.invoke(id, &AutomationInput::default()) {
            Ok(inv) => {
                if inv.result.is_success() {
                    successes += 1;
                } else {
                    failed = true;
                }
                let log_error = match &inv.log {
                    Persistence::Persisted => None,
                    Persistence::Failed(reason) => Some(format!("run log not written: {reason}")),
                };
                attempts.push(Attempt {
                    number,
                    status: inv.result.status.as_str().to_string(),
                    duration_ms: Some(inv.record.duration_ms),
                    output: serde_json::to_value(&inv.result).ok(),
                    error: log_error,
                });
            }
            Err(e) => {
                failed = true;
                attempts.push(Attempt {
                    number,
                    status: "error".into(),
                    duration_ms: None,
                    output: None,
                    error: Some(format!("{e:#}")),
                });
            }
        }
    }

    let log_files = registry
        .logger()
        .recent_files(id, times)
        .unwrap_or_default()
        .into_iter()
        .map(|p| relative_to(&p, registry.logger().root().parent()))
        .collect::<Vec<_>>();

    let date = clock::now_iso();
    let text = report::render_suite(&SuiteReport {
        automation: id,
        date: &date,
        attempts: &attempts,
        required: times,
        failed,
        log_files: &log_files,
    });

    let dir = reports_dir.join(id.as_str());
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let report_path = dir.join("TEST_REPORT.md");
    std::fs::write(&report_path, text)
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    tracing::info!(
        automation = %id,
        successes,
        attempts = attempts.len(),
        report = %report_path.display(),
        "finished automation tests"
    );

    Ok(SuiteOutcome {
        automation: id,
        successes,
        attempts: attempts.len(),
        failed,
        report_path,
    })
}

/// Run the suite for every automation in canonical order.
pub fn run_all_suites(config: &AppConfig, times: usize) -> Result<Vec<SuiteOutcome>> {
    let registry = Registry::from_config(config);
    AutomationId::ALL
        .into_iter()
        .map(|id| run_automation_suite(&registry, id, times, &config.paths.reports_dir))
        .collect()
}

fn relative_to(path: &Path, base: Option<&Path>) -> PathBuf {
    base.and_then(|b| path.strip_prefix(b).ok())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.to_path_buf())
}
