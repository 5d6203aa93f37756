use serde_json::Value;

use crate::models::event::{Event, EventAction};

/// A builder for creating `Event` instances for testing.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: Event,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBuilder {
    /// Creates a builder for a first-occurrence `create` event with nothing
    /// else set.
    pub fn new() -> Self {
        Self { event: Event::default() }
    }

    /// Sets the client name.
    pub fn client_name(mut self, name: &str) -> Self {
        self.event.client.name = name.to_string();
        self
    }

    /// Sets the client address.
    pub fn client_address(mut self, address: &str) -> Self {
        self.event.client.address = Some(address.to_string());
        self
    }

    /// Sets the `Display Name` client tag.
    pub fn display_name(mut self, name: &str) -> Self {
        self.event.client.tags.insert("Display Name".to_string(), Value::String(name.into()));
        self
    }

    /// Sets the check name.
    pub fn check_name(mut self, name: &str) -> Self {
        self.event.check.name = name.to_string();
        self
    }

    /// Sets the check status.
    pub fn status(mut self, status: i64) -> Self {
        self.event.check.status = status;
        self
    }

    /// Sets the check output.
    pub fn output(mut self, output: &str) -> Self {
        self.event.check.output = Some(output.to_string());
        self
    }

    /// Sets the check interval.
    pub fn interval(mut self, interval: i64) -> Self {
        self.event.check.interval = interval;
        self
    }

    /// Sets `alert_after`.
    pub fn alert_after(mut self, alert_after: i64) -> Self {
        self.event.check.alert_after = alert_after;
        self
    }

    /// Sets `realert_every`.
    pub fn realert_every(mut self, realert_every: i64) -> Self {
        self.event.check.realert_every = Some(realert_every);
        self
    }

    /// Sets `page_after`.
    pub fn page_after(mut self, page_after: i64) -> Self {
        self.event.check.page_after = Some(page_after);
        self
    }

    /// Marks the check as paging.
    pub fn page(mut self, page: bool) -> Self {
        self.event.check.page = page;
        self
    }

    /// Sets the owning team.
    pub fn team(mut self, team: &str) -> Self {
        self.event.check.team = Some(team.to_string());
        self
    }

    /// Sets the runbook link.
    pub fn runbook(mut self, runbook: &str) -> Self {
        self.event.check.runbook = Some(runbook.to_string());
        self
    }

    /// Sets the tip.
    pub fn tip(mut self, tip: &str) -> Self {
        self.event.check.tip = Some(tip.to_string());
        self
    }

    /// Sets the description override.
    pub fn notification(mut self, notification: &str) -> Self {
        self.event.check.notification = Some(notification.to_string());
        self
    }

    /// Sets the execution timestamp.
    pub fn issued(mut self, issued: i64) -> Self {
        self.event.check.issued = Some(issued);
        self
    }

    /// Sets an arbitrary check attribute, such as a channel override.
    pub fn check_field(mut self, key: &str, value: Value) -> Self {
        self.event.check.extra.insert(key.to_string(), value);
        self
    }

    /// Sets the occurrence count.
    pub fn occurrences(mut self, occurrences: i64) -> Self {
        self.event.occurrences = occurrences;
        self
    }

    /// Sets the occurrence watermark.
    pub fn occurrences_watermark(mut self, watermark: i64) -> Self {
        self.event.occurrences_watermark = Some(watermark);
        self
    }

    /// Sets the event action.
    pub fn action(mut self, action: EventAction) -> Self {
        self.event.action = action;
        self
    }

    /// Builds the `Event` instance.
    pub fn build(self) -> Event {
        self.event
    }
}
