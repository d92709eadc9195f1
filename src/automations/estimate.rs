use super::Automation;
use crate::model::{AutomationId, AutomationInput};
use anyhow::Result;
use rand::Rng;

const BASE_COST: f64 = 100.0;

/// Drafts a placeholder estimate; the total is a random multiple of the base cost.
pub struct EstimateGenerator {
    client_name: String,
}

impl EstimateGenerator {
    pub fn new(client_name: String) -> Self {
        Self { client_name }
    }
}

impl Automation for EstimateGenerator {
    fn id(&self) -> AutomationId {
        AutomationId::EstimateGenerator
    }

    fn run(&self, _input: &AutomationInput) -> Result<String> {
        let multiplier: f64 = rand::thread_rng().gen_range(1.0..3.0);
        let total = (BASE_COST * multiplier).round() as u64;
        Ok(format!(
            "A draft estimate of ${total} has been prepared for {}. Please review and customise before sending it to your customer.",
            self.client_name
        ))
    }
}
