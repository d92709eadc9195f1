//! Markdown report rendering for the test runner.

use crate::model::AutomationId;
use std::path::PathBuf;

/// One attempt in a per-automation suite.
#[derive(Debug, Clone)]
pub(crate) struct Attempt {
    pub number: usize,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

pub(crate) struct SuiteReport<'a> {
    pub automation: AutomationId,
    pub date: &'a str,
    pub attempts: &'a [Attempt],
    pub required: usize,
    pub failed: bool,
    pub log_files: &'a [PathBuf],
}

/// One pass of the end-to-end flow.
#[derive(Debug, Clone, Default)]
pub(crate) struct GlobalRun {
    pub number: usize,
    pub audit_response: Option<serde_json::Value>,
    pub row_added: Option<bool>,
    pub automation_responses: Vec<(AutomationId, serde_json::Value)>,
    pub error: Option<String>,
}

/// `lead-capture` -> `Lead Capture`.
pub(crate) fn human_name(id: AutomationId) -> String {
    id.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_json(lines: &mut Vec<String>, value: &serde_json::Value) {
    lines.push("```json".into());
    lines.push(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
    lines.push("```".into());
}

pub(crate) fn render_suite(report: &SuiteReport<'_>) -> String {
    let mut lines = vec![
        format!("# Test Report - {}", human_name(report.automation)),
        String::new(),
        format!("Date: {}", report.date),
        String::new(),
    ];
    for attempt in report.attempts {
        lines.push(format!("### Run {}", attempt.number));
        lines.push(format!("Status: {}", attempt.status));
        if let Some(ms) = attempt.duration_ms {
            lines.push(format!("Duration: {ms} ms"));
        }
        if let Some(output) = &attempt.output {
            lines.push("Output:".into());
            push_json(&mut lines, output);
        }
        if let Some(error) = &attempt.error {
            lines.push(format!("Error: {error}"));
        }
        lines.push(String::new());
    }
    lines.push("---".into());
    if report.failed {
        lines.push(
            "**Result:** Failure. One or more runs did not return a success status.".into(),
        );
    } else {
        lines.push(format!(
            "**Result:** Success. {} consecutive runs completed successfully.",
            report.required
        ));
    }
    if !report.log_files.is_empty() {
        lines.push(String::new());
        lines.push("Recent Log Files:".into());
        for file in report.log_files {
            lines.push(format!("- {}", file.display()));
        }
    }
    lines.join("\n")
}

pub(crate) fn render_global(date: &str, runs: &[GlobalRun]) -> String {
    let mut lines = vec![
        "# Global Test Report".to_string(),
        String::new(),
        format!("Date: {date}"),
        String::new(),
    ];
    for run in runs {
        lines.push(format!("## Global Run {}", run.number));
        if let Some(response) = &run.audit_response {
            lines.push("Audit submission response:".into());
            push_json(&mut lines, response);
        }
        if let Some(added) = run.row_added {
            lines.push(format!(
                "Row added to audit CSV: {}",
                if added { "Yes" } else { "No" }
            ));
        }
        for (id, response) in &run.automation_responses {
            lines.push(format!("Automation result for {id}:"));
            push_json(&mut lines, response);
        }
        if let Some(error) = &run.error {
            lines.push(format!("Error during run {}: {error}", run.number));
        }
        lines.push(String::new());
    }
    lines.push("---".into());
    lines.push("Global tests completed.".into());
    lines.join("\n")
}
