use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of automations the front end can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationId {
    LeadCapture,
    SmartBooking,
    EstimateGenerator,
    ReputationFollowup,
    InvoiceTracking,
}

impl AutomationId {
    /// Canonical order, which is also the recommendation priority order.
    pub const ALL: [AutomationId; 5] = [
        AutomationId::LeadCapture,
        AutomationId::SmartBooking,
        AutomationId::EstimateGenerator,
        AutomationId::ReputationFollowup,
        AutomationId::InvoiceTracking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AutomationId::LeadCapture => "lead-capture",
            AutomationId::SmartBooking => "smart-booking",
            AutomationId::EstimateGenerator => "estimate-generator",
            AutomationId::ReputationFollowup => "reputation-followup",
            AutomationId::InvoiceTracking => "invoice-tracking",
        }
    }

    /// Human-facing name, used both in recommendations and in run results.
    pub fn display_name(self) -> &'static str {
        match self {
            AutomationId::LeadCapture => "Lead Capture & Auto-Response",
            AutomationId::SmartBooking => "Smart Booking & Reminders",
            AutomationId::EstimateGenerator => "Quick Estimate Generator",
            AutomationId::ReputationFollowup => "Review & Reputation Follow-Up",
            AutomationId::InvoiceTracking => "Invoice Tracking & Reminders",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.display_name() == name)
    }

    /// Environment key of the enable/disable toggle, e.g. `AUTOMATION_LEAD_CAPTURE_ENABLED`.
    pub fn toggle_key(self) -> String {
        format!(
            "AUTOMATION_{}_ENABLED",
            self.as_str().replace('-', "_").to_ascii_uppercase()
        )
    }
}

impl fmt::Display for AutomationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown automation: {s}"))
    }
}

/// A flat intake form submission. Every field is optional and defaults to "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditSubmission {
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub phone: String,
    pub service_type: String,
    pub city: String,
    pub team_size: String,
    pub lead_sources: String,
    pub tools: String,
    pub bottlenecks: String,
    pub followups: String,
    pub notes: String,
}

impl AuditSubmission {
    /// Build a submission from loosely typed key/value pairs; unknown keys are ignored.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        let get = |k: &str| fields.get(k).cloned().unwrap_or_default();
        Self {
            name: get("name"),
            business_name: get("businessName"),
            email: get("email"),
            phone: get("phone"),
            service_type: get("serviceType"),
            city: get("city"),
            team_size: get("teamSize"),
            lead_sources: get("leadSources"),
            tools: get("tools"),
            bottlenecks: get("bottlenecks"),
            followups: get("followups"),
            notes: get("notes"),
        }
    }

    /// Build a submission from a JSON object. Non-string scalars are rendered as text,
    /// `null` counts as absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let fields = obj
            .iter()
            .filter_map(|(k, v)| {
                let text = match v {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((k.clone(), text))
            })
            .collect();
        Some(Self::from_fields(&fields))
    }

    /// Fields in ledger column order (without timestamp, recommendations and status).
    pub fn ledger_fields(&self) -> [&str; 12] {
        [
            self.name.as_str(),
            self.business_name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.service_type.as_str(),
            self.city.as_str(),
            self.team_size.as_str(),
            self.lead_sources.as_str(),
            self.tools.as_str(),
            self.bottlenecks.as_str(),
            self.followups.as_str(),
            self.notes.as_str(),
        ]
    }
}

/// Outcome of a best-effort write: the caller is never failed by it, but can observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Persisted,
    Failed(String),
}

impl Persistence {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Persistence::Persisted)
    }

    pub fn from_result(r: anyhow::Result<()>) -> Self {
        match r {
            Ok(()) => Persistence::Persisted,
            Err(e) => Persistence::Failed(format!("{e:#}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

/// What an automation hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationResult {
    pub status: RunStatus,
    pub name: String,
    pub message: String,
}

impl AutomationResult {
    pub fn success(id: AutomationId, message: String) -> Self {
        Self {
            status: RunStatus::Success,
            name: id.display_name().to_string(),
            message,
        }
    }

    pub fn error(id: AutomationId, message: String) -> Self {
        Self {
            status: RunStatus::Error,
            name: id.display_name().to_string(),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Optional caller-provided input for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub message: String,
    pub trace: String,
}

/// One persisted record per automation invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLogRecord {
    pub automation: AutomationId,
    pub start: String,
    pub end: String,
    pub duration_ms: i64,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub error: Option<RunError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings_and_names() {
        for id in AutomationId::ALL {
            assert_eq!(id.as_str().parse::<AutomationId>().unwrap(), id);
            assert_eq!(AutomationId::from_display_name(id.display_name()), Some(id));
        }
        assert!("lead_capture".parse::<AutomationId>().is_err());
    }

    #[test]
    fn toggle_keys_use_upper_snake_case() {
        assert_eq!(
            AutomationId::ReputationFollowup.toggle_key(),
            "AUTOMATION_REPUTATION_FOLLOWUP_ENABLED"
        );
    }

    #[test]
    fn json_submission_defaults_missing_and_stringifies_scalars() {
        let v = serde_json::json!({"name": "Ann", "teamSize": 3, "notes": null, "extra": "x"});
        let s = AuditSubmission::from_json(&v).unwrap();
        assert_eq!(s.name, "Ann");
        assert_eq!(s.team_size, "3");
        assert_eq!(s.notes, "");
        assert_eq!(s.email, "");
        assert!(AuditSubmission::from_json(&serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn result_serializes_lowercase_status() {
        let r = AutomationResult::success(AutomationId::InvoiceTracking, "ok".into());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["name"], "Invoice Tracking & Reminders");
    }
}
