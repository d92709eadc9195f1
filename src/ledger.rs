//! Append-only delimited-text ledgers.
//!
//! Every field is written quoted with embedded quotes doubled. Appends are not
//! locked; two writers racing on the same file may interleave rows.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const AUDIT_HEADER: &str = "timestamp,name,businessName,email,phone,serviceType,city,teamSize,leadSources,tools,bottlenecks,followups,notes,recommendations,status";
pub const LEADS_HEADER: &str = "timestamp,name,channel,notes";

pub fn encode_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Encode one record, newline-terminated.
pub fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| encode_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Split ledger text into records. Quoted fields may contain commas, doubled quotes
/// and line breaks; blank lines between records are skipped.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut touched = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                touched = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                touched = true;
            }
            '\r' => {}
            '\n' => {
                if touched || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                touched = false;
            }
            _ => field.push(c),
        }
    }
    if touched || !field.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// One ledger file with a fixed header row.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    header: &'static str,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>, header: &'static str) -> Self {
        Self {
            path: path.into(),
            header,
        }
    }

    pub fn audit(path: impl Into<PathBuf>) -> Self {
        Self::new(path, AUDIT_HEADER)
    }

    pub fn leads(path: impl Into<PathBuf>) -> Self {
        Self::new(path, LEADS_HEADER)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, creating the parent directory and header row on first write.
    pub fn append<S: AsRef<str>>(&self, fields: &[S]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let exists = self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut buf = String::new();
        if !exists {
            buf.push_str(self.header);
            buf.push('\n');
        }
        buf.push_str(&encode_row(fields));
        file.write_all(buf.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }

    /// All data rows, header excluded. A missing file has no rows.
    pub fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        Ok(parse_records(&text).into_iter().skip(1).collect())
    }

    pub fn count_rows(&self) -> Result<usize> {
        Ok(self.read_rows()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_row(line: &str) -> Vec<String> {
        parse_records(line).remove(0)
    }

    #[test]
    fn quotes_every_field_and_doubles_quotes() {
        assert_eq!(
            encode_row(&["a", "O'Brien \"Plumbing\"", "x,y"]),
            "\"a\",\"O'Brien \"\"Plumbing\"\"\",\"x,y\"\n"
        );
        assert_eq!(encode_field(""), "\"\"");
    }

    #[test]
    fn quoted_values_parse_back_unchanged() {
        let fields = ["O'Brien \"Plumbing\"", "a,b", "", "line1\nline2", "\"\""];
        assert_eq!(parse_row(&encode_row(&fields)), fields);
    }

    #[test]
    fn parses_unquoted_and_empty_fields() {
        assert_eq!(parse_row("a,,b\r\n"), vec!["a", "", "b"]);
        assert_eq!(parse_records("h1,h2\n\n1,2\n").len(), 2);
    }

    #[test]
    fn append_writes_header_once_and_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::leads(dir.path().join("nested").join("leads.csv"));
        assert_eq!(ledger.count_rows().unwrap(), 0);

        ledger.append(&["t1", "Ann", "Web form", "multi\nline"]).unwrap();
        ledger.append(&["t2", "Bob", "Phone", ""]).unwrap();

        let text = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(text.starts_with(&format!("{LEADS_HEADER}\n")));
        assert_eq!(text.matches(LEADS_HEADER).count(), 1);
        assert_eq!(ledger.count_rows().unwrap(), 2);
        assert_eq!(ledger.read_rows().unwrap()[0][3], "multi\nline");
    }

    #[test]
    fn append_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();
        let ledger = Ledger::audit(blocker.join("audit_results.csv"));
        assert!(ledger.append(&["x"]).is_err());
    }
}
