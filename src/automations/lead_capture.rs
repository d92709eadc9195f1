use super::Automation;
use crate::clock;
use crate::ledger::Ledger;
use crate::model::{AutomationId, AutomationInput};
use anyhow::{Context, Result};

const LEAD_NAME: &str = "Test Lead";
const LEAD_CHANNEL: &str = "Web form";
const LEAD_NOTES: &str = "Example lead captured during automation test.";

/// Records a demo lead in the leads ledger and acknowledges it.
pub struct LeadCapture {
    client_name: String,
    leads: Ledger,
}

impl LeadCapture {
    pub fn new(client_name: String, leads: Ledger) -> Self {
        Self { client_name, leads }
    }
}

impl Automation for LeadCapture {
    fn id(&self) -> AutomationId {
        AutomationId::LeadCapture
    }

    fn input_summary(&self, _input: &AutomationInput) -> serde_json::Value {
        serde_json::json!({ "lead": { "channel": LEAD_CHANNEL } })
    }

    fn run(&self, _input: &AutomationInput) -> Result<String> {
        let timestamp = clock::now_iso();
        self.leads
            .append(&[timestamp.as_str(), LEAD_NAME, LEAD_CHANNEL, LEAD_NOTES])
            .context("failed to record lead")?;
        Ok(format!(
            "Hi {LEAD_NAME}, thanks for reaching out to {}! We've received your request and will get back to you shortly.",
            self.client_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_lead_and_names_business() {
        let dir = tempfile::tempdir().unwrap();
        let leads = Ledger::leads(dir.path().join("leads.csv"));
        let auto = LeadCapture::new("Acme Plumbing".into(), leads.clone());

        let msg = auto.run(&AutomationInput::default()).unwrap();
        assert!(msg.contains("thanks for reaching out to Acme Plumbing!"));
        auto.run(&AutomationInput::default()).unwrap();

        let rows = leads.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1..], [LEAD_NAME, LEAD_CHANNEL, LEAD_NOTES]);
    }

    #[test]
    fn unwritable_ledger_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "").unwrap();
        let auto = LeadCapture::new("Acme".into(), Ledger::leads(blocker.join("leads.csv")));
        let err = auto.run(&AutomationInput::default()).unwrap_err();
        assert_eq!(err.to_string(), "failed to record lead");
    }
}
