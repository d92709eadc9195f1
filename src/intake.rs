//! Audit intake: keyword rules over a form submission, plus the audit ledger append.

use crate::clock;
use crate::ledger::Ledger;
use crate::model::{AuditSubmission, AutomationId, Persistence};
use serde::Serialize;

const LEAD_SOURCE_KEYWORDS: &[&str] = &["phone", "text", "mix", "social"];

/// Bottleneck keywords per automation, evaluated in this order.
const BOTTLENECK_RULES: &[(AutomationId, &[&str])] = &[
    (AutomationId::SmartBooking, &["schedule", "booking", "calendar"]),
    (AutomationId::EstimateGenerator, &["estimate", "quote"]),
    (AutomationId::ReputationFollowup, &["review", "reputation"]),
    (AutomationId::InvoiceTracking, &["invoice", "payment", "collect"]),
];

const FALLBACK: [AutomationId; 2] = [AutomationId::LeadCapture, AutomationId::SmartBooking];

pub const NEW_STATUS: &str = "New";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Every matching rule fires; the result is de-duplicated in first-seen order and
/// falls back to lead capture plus booking when nothing matched.
pub fn recommend(submission: &AuditSubmission) -> Vec<AutomationId> {
    let lead_sources = submission.lead_sources.to_lowercase();
    let bottlenecks = submission.bottlenecks.to_lowercase();

    let mut fired = Vec::new();
    if contains_any(&lead_sources, LEAD_SOURCE_KEYWORDS) {
        fired.push(AutomationId::LeadCapture);
    }
    for (id, keywords) in BOTTLENECK_RULES {
        if contains_any(&bottlenecks, keywords) {
            fired.push(*id);
        }
    }
    if fired.is_empty() {
        fired.extend(FALLBACK);
    }

    let mut unique = Vec::with_capacity(fired.len());
    for id in fired {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

pub fn recommendation_names(ids: &[AutomationId]) -> Vec<String> {
    ids.iter().map(|id| id.display_name().to_string()).collect()
}

/// What a submission produced. The submission is accepted whether or not the ledger write worked.
#[derive(Debug, Clone)]
pub struct IntakeReceipt {
    pub recommendations: Vec<AutomationId>,
    pub persistence: Persistence,
}

/// JSON body of a successful `POST /api/audit`.
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub success: bool,
    pub recommendations: Vec<String>,
    pub persisted: bool,
}

impl From<&IntakeReceipt> for IntakeResponse {
    fn from(r: &IntakeReceipt) -> Self {
        Self {
            success: true,
            recommendations: recommendation_names(&r.recommendations),
            persisted: r.persistence.is_persisted(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditIntake {
    ledger: Ledger,
}

impl AuditIntake {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn submit(&self, submission: &AuditSubmission) -> IntakeReceipt {
        let recommendations = recommend(submission);
        let joined = recommendation_names(&recommendations).join("; ");

        let timestamp = clock::now_iso();
        let mut row: Vec<&str> = Vec::with_capacity(15);
        row.push(&timestamp);
        row.extend(submission.ledger_fields());
        row.push(&joined);
        row.push(NEW_STATUS);

        let persistence = Persistence::from_result(self.ledger.append(&row));
        if let Persistence::Failed(reason) = &persistence {
            tracing::error!(
                ledger = %self.ledger.path().display(),
                error = %reason,
                "failed to persist audit submission"
            );
        }
        IntakeReceipt {
            recommendations,
            persistence,
        }
    }
}
