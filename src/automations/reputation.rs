use super::Automation;
use crate::model::{AutomationId, AutomationInput};
use anyhow::Result;

pub const REVIEW_LINK: &str = "https://g.page/r/yourbusinessreview";

pub struct ReputationFollowup {
    client_name: String,
}

impl ReputationFollowup {
    pub fn new(client_name: String) -> Self {
        Self { client_name }
    }
}

impl Automation for ReputationFollowup {
    fn id(&self) -> AutomationId {
        AutomationId::ReputationFollowup
    }

    fn run(&self, _input: &AutomationInput) -> Result<String> {
        Ok(format!(
            "Thank you for choosing {}! We'd love your feedback. Please leave us a review: {REVIEW_LINK}",
            self.client_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_links_review_page() {
        let msg = ReputationFollowup::new("Acme".into())
            .run(&AutomationInput::default())
            .unwrap();
        assert!(msg.starts_with("Thank you for choosing Acme!"));
        assert!(msg.ends_with(REVIEW_LINK));
    }
}
