use super::Automation;
use crate::model::{AutomationId, AutomationInput};
use anyhow::{Context, Result};
use rand::Rng;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// Books a demo appointment 1 to 7 days out at 10:00.
pub struct SmartBooking {
    client_name: String,
}

impl SmartBooking {
    pub fn new(client_name: String) -> Self {
        Self { client_name }
    }
}

/// Local date when the offset can be determined, UTC otherwise.
fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub(crate) fn booking_message(client: &str, today: Date, offset_days: i64) -> Result<String> {
    let at = (today + Duration::days(offset_days)).with_time(time::macros::time!(10:00));
    let date = at
        .format(format_description!(
            "[weekday repr:short] [month repr:short] [day] [year]"
        ))
        .context("format appointment date")?;
    let clock = at
        .format(format_description!(
            "[hour repr:12]:[minute] [period case:upper]"
        ))
        .context("format appointment time")?;
    Ok(format!("Appointment booked for {client} on {date} at {clock}."))
}

impl Automation for SmartBooking {
    fn id(&self) -> AutomationId {
        AutomationId::SmartBooking
    }

    fn run(&self, input: &AutomationInput) -> Result<String> {
        let client = input
            .client_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.client_name);
        let offset = rand::thread_rng().gen_range(1..=7);
        booking_message(client, today(), offset)
    }
}
