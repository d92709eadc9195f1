//! Per-run structured logs under `logs/<automation>/<stamp>.log`.

use crate::clock;
use crate::model::{AutomationId, Persistence, RunError, RunLogRecord};
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Timing and summaries for one finished run.
pub struct RunRecordParams<'a> {
    pub automation: AutomationId,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub error: Option<&'a anyhow::Error>,
}

#[derive(Debug, Clone)]
pub struct RunLogger {
    root: PathBuf,
}

impl RunLogger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dir_for(&self, automation: AutomationId) -> PathBuf {
        self.root.join(automation.as_str())
    }

    /// Write the record and echo it to the log. Never fails the caller.
    pub fn record(&self, params: RunRecordParams<'_>) -> (RunLogRecord, Persistence) {
        let record = build_record(params);
        let persistence = Persistence::from_result(self.write(&record));
        match &persistence {
            Persistence::Persisted => {}
            Persistence::Failed(reason) => tracing::error!(
                automation = %record.automation,
                error = %reason,
                "failed to write run log"
            ),
        }
        (record, persistence)
    }

    fn write(&self, record: &RunLogRecord) -> Result<()> {
        let body = serde_json::to_string_pretty(record).context("serialize run log")?;
        tracing::info!(automation = %record.automation, "{body}");

        let dir = self.dir_for(record.automation);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let stamp = clock::file_safe(&record.start);
        let mut file = create_unique(&dir, &stamp)?;
        file.write_all(body.as_bytes())
            .context("failed to write run log body")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Most recent `limit` log files for an automation, oldest first.
    pub fn recent_files(&self, automation: AutomationId, limit: usize) -> Result<Vec<PathBuf>> {
        let dir = self.dir_for(automation);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = std::fs::read_dir(&dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("log"))
            .collect::<Vec<_>>();
        files.sort();
        let skip = files.len().saturating_sub(limit);
        Ok(files.split_off(skip))
    }
}

/// `<stamp>.log`, or `<stamp>_<nnnn>.log` when runs start within the same millisecond.
fn create_unique(dir: &Path, stamp: &str) -> Result<File> {
    let mut n = 0usize;
    loop {
        let name = if n == 0 {
            format!("{stamp}.log")
        } else {
            format!("{stamp}_{n:04}.log")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to create {}", path.display()))
            }
        }
    }
}

fn build_record(params: RunRecordParams<'_>) -> RunLogRecord {
    RunLogRecord {
        automation: params.automation,
        start: clock::iso_millis(params.start),
        end: clock::iso_millis(params.end),
        duration_ms: clock::millis_between(params.start, params.end),
        input: params.input,
        output: params.output,
        error: params.error.map(|e| RunError {
            message: e.to_string(),
            trace: format!("{e:?}"),
        }),
    }
}

#[cfg(test)]
pub fn read_record(path: &Path) -> Result<RunLogRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn params(error: Option<&anyhow::Error>) -> RunRecordParams<'_> {
        RunRecordParams {
            automation: AutomationId::InvoiceTracking,
            start: datetime!(2026-03-04 05:06:07.089 UTC),
            end: datetime!(2026-03-04 05:06:07.131 UTC),
            input: serde_json::json!({}),
            output: serde_json::json!({"status": "success"}),
            error,
        }
    }

    #[test]
    fn writes_one_file_named_after_start() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path());
        let (record, persistence) = logger.record(params(None));
        assert!(persistence.is_persisted());
        assert_eq!(record.duration_ms, 42);

        let path = dir
            .path()
            .join("invoice-tracking")
            .join("2026-03-04T05-06-07-089Z.log");
        let back = read_record(&path).unwrap();
        assert_eq!(back.start, "2026-03-04T05:06:07.089Z");
        assert_eq!(back.end, "2026-03-04T05:06:07.131Z");
        assert!(back.error.is_none());
        assert_eq!(logger.recent_files(AutomationId::InvoiceTracking, 5).unwrap(), vec![path]);
    }

    #[test]
    fn error_carries_message_and_trace() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path());
        let err = anyhow::anyhow!("disk full").context("append lead");
        let (record, _) = logger.record(params(Some(&err)));
        let e = record.error.unwrap();
        assert_eq!(e.message, "append lead");
        assert!(e.trace.contains("disk full"));

        let raw = serde_json::to_value(read_record(
            &logger
                .recent_files(AutomationId::InvoiceTracking, 1)
                .unwrap()[0],
        )
        .unwrap())
        .unwrap();
        assert_eq!(raw["durationMs"], 42);
        assert_eq!(raw["automation"], "invoice-tracking");
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, "file in the way").unwrap();
        let (record, persistence) = RunLogger::new(&blocker).record(params(None));
        assert!(!persistence.is_persisted());
        assert_eq!(record.automation, AutomationId::InvoiceTracking);
    }

    #[test]
    fn same_millisecond_runs_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path());
        for _ in 0..3 {
            assert!(logger.record(params(None)).1.is_persisted());
        }
        let names: Vec<String> = logger
            .recent_files(AutomationId::InvoiceTracking, 10)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "2026-03-04T05-06-07-089Z.log",
                "2026-03-04T05-06-07-089Z_0001.log",
                "2026-03-04T05-06-07-089Z_0002.log",
            ]
        );
    }

    #[test]
    fn collision_suffixes_sort_past_nine() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path());
        for _ in 0..12 {
            assert!(logger.record(params(None)).1.is_persisted());
        }
        let recent = logger.recent_files(AutomationId::InvoiceTracking, 2).unwrap();
        let names: Vec<_> = recent
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "2026-03-04T05-06-07-089Z_0010.log",
                "2026-03-04T05-06-07-089Z_0011.log",
            ]
        );
    }

    #[test]
    fn recent_files_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path());
        let sub = logger.dir_for(AutomationId::LeadCapture);
        std::fs::create_dir_all(&sub).unwrap();
        for name in ["a.log", "c.log", "b.log", "notes.txt"] {
            std::fs::write(sub.join(name), "{}").unwrap();
        }
        let recent = logger.recent_files(AutomationId::LeadCapture, 2).unwrap();
        assert_eq!(recent, vec![sub.join("b.log"), sub.join("c.log")]);
    }
}
