//! Demo automations and the registry that runs them.
//!
//! Each automation produces a message; the registry brackets every call with a
//! run log record and turns failures into `status: "error"` results.

mod estimate;
mod invoice;
mod lead_capture;
mod reputation;
mod smart_booking;

use crate::config::AppConfig;
use crate::ledger::Ledger;
use crate::model::{AutomationId, AutomationInput, AutomationResult, Persistence, RunLogRecord};
use crate::run_log::{RunLogger, RunRecordParams};
use anyhow::Result;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use time::OffsetDateTime;

pub use estimate::EstimateGenerator;
pub use invoice::InvoiceTracking;
pub use lead_capture::LeadCapture;
pub use reputation::ReputationFollowup;
pub use smart_booking::SmartBooking;

pub trait Automation: Send + Sync {
    fn id(&self) -> AutomationId;

    /// What goes into the run log's `input` field.
    fn input_summary(&self, input: &AutomationInput) -> serde_json::Value {
        serde_json::to_value(input).unwrap_or_default()
    }

    /// Produce the result message.
    fn run(&self, input: &AutomationInput) -> Result<String>;
}

/// A completed invocation and what happened to its run log.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub result: AutomationResult,
    pub record: RunLogRecord,
    pub log: Persistence,
}

pub struct Registry {
    handlers: BTreeMap<AutomationId, Box<dyn Automation>>,
    logger: RunLogger,
}

impl Registry {
    pub fn new(logger: RunLogger) -> Self {
        Self {
            handlers: BTreeMap::new(),
            logger,
        }
    }

    /// All five automations wired to the given configuration.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let client = cfg.client_name().to_string();
        Self::new(RunLogger::new(&cfg.paths.logs_dir))
            .with(LeadCapture::new(
                client.clone(),
                Ledger::leads(cfg.paths.leads_ledger()),
            ))
            .with(SmartBooking::new(client.clone()))
            .with(EstimateGenerator::new(client.clone()))
            .with(ReputationFollowup::new(client))
            .with(InvoiceTracking)
    }

    pub fn with(mut self, handler: impl Automation + 'static) -> Self {
        self.handlers.insert(handler.id(), Box::new(handler));
        self
    }

    pub fn contains(&self, id: AutomationId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    /// Run one automation. Exactly one run log record is written per call.
    ///
    /// An `Err` from the handler becomes an error result; only a panic inside the
    /// handler (or an unregistered id) surfaces as `Err` here.
    pub fn invoke(&self, id: AutomationId, input: &AutomationInput) -> Result<Invocation> {
        let handler = self
            .handlers
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("automation {id} is not registered"))?;

        let input_summary = handler.input_summary(input);
        let start = OffsetDateTime::now_utc();
        let outcome = catch_unwind(AssertUnwindSafe(|| handler.run(input)));
        let end = OffsetDateTime::now_utc();

        let (result, error) = match outcome {
            Ok(Ok(message)) => (Some(AutomationResult::success(id, message)), None),
            Ok(Err(e)) => {
                tracing::warn!(automation = %id, error = %format!("{e:#}"), "automation failed");
                (Some(AutomationResult::error(id, e.to_string())), Some(e))
            }
            Err(payload) => {
                let e = anyhow::anyhow!("automation panicked: {}", panic_message(&*payload));
                (None, Some(e))
            }
        };

        let output = result
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok())
            .unwrap_or_else(|| serde_json::json!({}));
        let (record, log) = self.logger.record(RunRecordParams {
            automation: id,
            start,
            end,
            input: input_summary,
            output,
            error: error.as_ref(),
        });

        match result {
            Some(result) => Ok(Invocation {
                result,
                record,
                log,
            }),
            None => Err(error.unwrap_or_else(|| anyhow::anyhow!("automation {id} failed"))),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
