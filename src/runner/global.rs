//! End-to-end pass: spawn the server, submit audits over HTTP, check the ledger,
//! run every recommended automation.

use super::report::{self, GlobalRun};
use crate::clock;
use crate::config::AppConfig;
use crate::ledger::Ledger;
use crate::model::AutomationId;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub port: u16,
    pub times: usize,
    /// Fixed wait after spawning the server; readiness is not polled.
    pub startup_delay: Duration,
    /// Binary started as `<exe> serve --port <port> --root <root>`.
    pub server_exe: PathBuf,
}

fn synthetic_payload(n: usize) -> Value {
    serde_json::json!({
        "name": format!("Test User {n}"),
        "businessName": format!("Test Biz {n}"),
        "email": format!("test{n}@example.com"),
        "phone": "",
        "serviceType": "Plumbing",
        "city": "Test City",
        "teamSize": "2-4",
        "leadSources": "phone; text",
        "tools": "None",
        "bottlenecks": "schedule; invoice",
        "followups": "we call back",
        "notes": "",
    })
}

async fn json_or_empty(res: reqwest::Response) -> Value {
    res.json().await.unwrap_or_else(|_| serde_json::json!({}))
}

async fn drive_pass(
    run: &mut GlobalRun,
    client: &reqwest::Client,
    base: &str,
    ledger: &Ledger,
) -> Result<()> {
    let before = ledger.count_rows()?;
    let res = client
        .post(format!("{base}/api/audit"))
        .json(&synthetic_payload(run.number))
        .send()
        .await
        .context("audit submission failed")?;
    let body = json_or_empty(res).await;
    let recommendations = body["recommendations"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    run.audit_response = Some(body);

    let after = ledger.count_rows()?;
    run.row_added = Some(after == before + 1);

    for rec in recommendations {
        let Some(id) = rec.as_str().and_then(AutomationId::from_display_name) else {
            continue;
        };
        let res = client
            .get(format!("{base}/api/automation/{id}"))
            .send()
            .await
            .with_context(|| format!("automation request for {id} failed"))?;
        run.automation_responses.push((id, json_or_empty(res).await));
    }
    Ok(())
}

/// Run `times` passes against a server at `base`. Failures are recorded per pass.
pub(crate) async fn drive_passes(base: &str, ledger: &Ledger, times: usize) -> Vec<GlobalRun> {
    let client = reqwest::Client::new();
    let mut runs = Vec::with_capacity(times);
    for number in 1..=times {
        let mut run = GlobalRun {
            number,
            ..Default::default()
        };
        if let Err(e) = drive_pass(&mut run, &client, base, ledger).await {
            tracing::warn!(run = number, error = %format!("{e:#}"), "global run failed");
            run.error = Some(format!("{e:#}"));
        }
        if run.row_added == Some(false) {
            tracing::warn!(run = number, "audit ledger row count did not grow by one");
        }
        runs.push(run);
    }
    runs
}

/// Spawn the server, drive it, write `reports/GLOBAL_TEST_REPORT.md` and stop the server.
pub async fn run_global(config: &AppConfig, opts: &GlobalOptions) -> Result<PathBuf> {
    let date = clock::now_iso();
    let mut child = Command::new(&opts.server_exe)
        .arg("serve")
        .arg("--port")
        .arg(opts.port.to_string())
        .arg("--root")
        .arg(&config.paths.root)
        .env("PORT", opts.port.to_string())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {}", opts.server_exe.display()))?;
    tracing::info!(
        port = opts.port,
        delay = %humantime::format_duration(opts.startup_delay),
        "spawned server, waiting before first request"
    );
    tokio::time::sleep(opts.startup_delay).await;

    let base = format!("http://127.0.0.1:{}", opts.port);
    let ledger = Ledger::audit(config.paths.audit_ledger());
    let runs = drive_passes(&base, &ledger, opts.times).await;

    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to stop server process");
    }

    let dir = &config.paths.reports_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join("GLOBAL_TEST_REPORT.md");
    std::fs::write(&path, report::render_global(&date, &runs))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(report = %path.display(), "global test report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{build_router, AppState};
    use std::sync::Arc;

    #[tokio::test]
    async fn passes_add_rows_and_run_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_root(dir.path());
        let ledger = Ledger::audit(config.paths.audit_ledger());
        let app = build_router(Arc::new(AppState::new(config)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let runs = drive_passes(&base, &ledger, 2).await;
        assert_eq!(runs.len(), 2);
        for run in &runs {
            assert!(run.error.is_none(), "{:?}", run.error);
            assert_eq!(run.row_added, Some(true));
            let ids: Vec<AutomationId> = run.automation_responses.iter().map(|(id, _)| *id).collect();
            assert_eq!(
                ids,
                vec![
                    AutomationId::LeadCapture,
                    AutomationId::SmartBooking,
                    AutomationId::InvoiceTracking
                ]
            );
            for (_, body) in &run.automation_responses {
                assert_eq!(body["status"], "success");
            }
        }
        assert_eq!(ledger.count_rows().unwrap(), 2);
    }

    #[tokio::test]
    async fn unreachable_server_is_recorded_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::audit(dir.path().join("audit_results.csv"));
        let runs = drive_passes("http://127.0.0.1:9", &ledger, 1).await;
        assert!(runs[0].error.as_deref().unwrap().contains("audit submission failed"));
        assert!(runs[0].row_added.is_none());
    }
}
