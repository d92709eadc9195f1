use super::Automation;
use crate::model::{AutomationId, AutomationInput};
use anyhow::Result;
use rand::Rng;

/// Issues a fake invoice with a random id and amount.
pub struct InvoiceTracking;

impl Automation for InvoiceTracking {
    fn id(&self) -> AutomationId {
        AutomationId::InvoiceTracking
    }

    fn run(&self, _input: &AutomationInput) -> Result<String> {
        let mut rng = rand::thread_rng();
        let invoice_id = format!("INV-{}", rng.gen_range(0..1_000_000u32));
        let amount_due = (rng.gen::<f64>() * 500.0 + 50.0).round() as u64;
        Ok(format!(
            "Invoice {invoice_id} for ${amount_due} has been created and sent. Reminders will be sent every three days until payment is received."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_and_amount_are_in_range() {
        for _ in 0..50 {
            let msg = InvoiceTracking.run(&AutomationInput::default()).unwrap();
            let mut words = msg.split_whitespace().skip(1);
            let id = words.next().unwrap();
            let number: u32 = id.strip_prefix("INV-").unwrap().parse().unwrap();
            assert!(number < 1_000_000);
            let amount: u64 = words
                .nth(1)
                .unwrap()
                .strip_prefix('$')
                .unwrap()
                .parse()
                .unwrap();
            assert!((50..=550).contains(&amount), "{msg}");
        }
    }
}
