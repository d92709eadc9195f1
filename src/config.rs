//! Runtime configuration.
//!
//! Values come from the process environment layered over an optional `.env`
//! file in the project root. The process environment always wins and is never
//! modified; components receive an [`AppConfig`] at construction instead of
//! reading the environment themselves.

use crate::model::AutomationId;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CLIENT_NAME: &str = "Your business";

/// Parse `KEY=VALUE` lines. Blank lines, `#` comments and lines without `=` are skipped;
/// keys and values are trimmed and split at the first `=`.
pub fn parse_env_file(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let (key, value) = trimmed.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Merged key/value view over `.env` and the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// File values first, then `process` values on top.
    pub fn layered(
        file: impl IntoIterator<Item = (String, String)>,
        process: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut vars: HashMap<String, String> = file.into_iter().collect();
        vars.extend(process);
        Self { vars }
    }

    /// Read `<root>/.env` (if present) and layer the real process environment over it.
    pub fn load(root: &Path) -> Result<Self> {
        let env_path = root.join(".env");
        let file_vars = if env_path.exists() {
            let raw = std::fs::read_to_string(&env_path)
                .with_context(|| format!("failed to read {}", env_path.display()))?;
            parse_env_file(&raw)
        } else {
            Vec::new()
        };
        Ok(Self::layered(file_vars, std::env::vars()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Per-automation enable switches. Absent entries are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationToggles {
    disabled: BTreeSet<AutomationId>,
}

impl AutomationToggles {
    pub fn from_env(env: &EnvSource) -> Self {
        let disabled = AutomationId::ALL
            .into_iter()
            .filter(|id| {
                env.get(&id.toggle_key())
                    .map(toggle_value_disables)
                    .unwrap_or(false)
            })
            .collect();
        Self { disabled }
    }

    pub fn is_enabled(&self, id: AutomationId) -> bool {
        !self.disabled.contains(&id)
    }
}

/// Only `false` (any case) and `0` turn an automation off.
fn toggle_value_disables(v: &str) -> bool {
    let v = v.trim();
    v.eq_ignore_ascii_case("false") || v == "0"
}

/// Filesystem layout under the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub public_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            public_dir: root.join("public"),
            data_dir: root.join("data"),
            logs_dir: root.join("logs"),
            reports_dir: root.join("reports"),
            root,
        }
    }

    pub fn audit_ledger(&self) -> PathBuf {
        self.data_dir.join("audit_results.csv")
    }

    pub fn leads_ledger(&self) -> PathBuf {
        self.data_dir.join("leads.csv")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PORT`: listen port for `serve`.
    pub port: u16,
    /// `CLIENT_NAME`: business name substituted into automation messages.
    pub client_name: Option<String>,
    /// `AUTOMATION_<ID>_ENABLED`: per-automation switches.
    pub toggles: AutomationToggles,
    pub paths: ProjectPaths,
}

impl AppConfig {
    pub fn from_env(env: &EnvSource, root: impl Into<PathBuf>) -> Self {
        let port = match env.get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(value = raw, default = DEFAULT_PORT, "invalid PORT, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let client_name = env
            .get("CLIENT_NAME")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            port,
            client_name,
            toggles: AutomationToggles::from_env(env),
            paths: ProjectPaths::new(root),
        }
    }

    #[cfg(test)]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::from_env(&EnvSource::default(), root)
    }

    pub fn client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_file_skips_comments_blanks_and_bare_keys() {
        let text = "# comment\n\nPORT = 4100\r\nBARE\nCLIENT_NAME=Acme = Co\n  # indented\n";
        assert_eq!(
            parse_env_file(text),
            pairs(&[("PORT", "4100"), ("CLIENT_NAME", "Acme = Co")])
        );
    }

    #[test]
    fn process_env_wins_over_file() {
        let env = EnvSource::layered(
            pairs(&[("PORT", "4100"), ("CLIENT_NAME", "File Co")]),
            pairs(&[("PORT", "5000")]),
        );
        assert_eq!(env.get("PORT"), Some("5000"));
        assert_eq!(env.get("CLIENT_NAME"), Some("File Co"));
    }

    #[test]
    fn toggles_only_disable_on_false_or_zero() {
        let env = EnvSource::layered(
            pairs(&[
                ("AUTOMATION_LEAD_CAPTURE_ENABLED", "FALSE"),
                ("AUTOMATION_SMART_BOOKING_ENABLED", "0"),
                ("AUTOMATION_INVOICE_TRACKING_ENABLED", "no"),
                ("AUTOMATION_ESTIMATE_GENERATOR_ENABLED", "true"),
            ]),
            Vec::new(),
        );
        let t = AutomationToggles::from_env(&env);
        assert!(!t.is_enabled(AutomationId::LeadCapture));
        assert!(!t.is_enabled(AutomationId::SmartBooking));
        assert!(t.is_enabled(AutomationId::InvoiceTracking));
        assert!(t.is_enabled(AutomationId::EstimateGenerator));
        assert!(t.is_enabled(AutomationId::ReputationFollowup));
    }

    #[test]
    fn config_defaults_and_overrides() {
        let cfg = AppConfig::with_root("/srv/app");
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.client_name(), DEFAULT_CLIENT_NAME);
        assert_eq!(
            cfg.paths.audit_ledger(),
            PathBuf::from("/srv/app/data/audit_results.csv")
        );

        let env = EnvSource::layered(
            pairs(&[("PORT", "not-a-port"), ("CLIENT_NAME", "  ")]),
            Vec::new(),
        );
        let cfg = AppConfig::from_env(&env, ".");
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.client_name, None);
    }

    #[test]
    fn load_reads_dotenv_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "NEXORA_TEST_ONLY_KEY=from-file\n",
        )
        .unwrap();
        let env = EnvSource::load(dir.path()).unwrap();
        assert_eq!(env.get("NEXORA_TEST_ONLY_KEY"), Some("from-file"));
    }
}
