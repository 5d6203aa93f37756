//! Event filtering: decides whether an event reaches a human at all.

mod cadence;

pub use cadence::{
    CadenceFilter, CadenceParams, EXPONENTIAL_BACKOFF, KEEPALIVE_INTERVAL, is_power_of_two,
};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::models::event::Event;

/// Whether an event should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Handle the event.
    Allow,
    /// Drop the event.
    Suppress,
}

/// A filter decision together with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// Whether the event goes on.
    pub decision: Decision,
    /// Why, printed by the `filter` subcommand.
    pub reason: String,
}

impl FilterOutcome {
    /// An allowing outcome.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self { decision: Decision::Allow, reason: reason.into() }
    }

    /// A suppressing outcome.
    pub fn suppress(reason: impl Into<String>) -> Self {
        Self { decision: Decision::Suppress, reason: reason.into() }
    }

    /// `true` for [`Decision::Allow`].
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}

/// Which threshold gates the first notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterVariant {
    /// `alert_after` gates the first notification.
    #[default]
    Standard,
    /// `page_after`, when the check sets it, replaces `alert_after`.
    Paging,
}

/// A named event filter, the shape Sensu server extensions take.
#[cfg_attr(test, automock)]
pub trait EventFilter: Send + Sync {
    /// Name the filter is registered under.
    fn name(&self) -> &'static str;

    /// One-line description of the filter.
    fn description(&self) -> &'static str;

    /// Decides whether `event` should be handled.
    fn filter(&self, event: &Event) -> FilterOutcome;
}

impl EventFilter for CadenceFilter {
    fn name(&self) -> &'static str {
        match self.variant() {
            FilterVariant::Standard => "num_occurrences_filter",
            FilterVariant::Paging => "num_occurrences_filter_for_pagerduty",
        }
    }

    fn description(&self) -> &'static str {
        match self.variant() {
            FilterVariant::Standard => "filter events based on the number of occurrences",
            FilterVariant::Paging => {
                "filter events based on the number of occurrences for pagerduty handler"
            }
        }
    }

    fn filter(&self, event: &Event) -> FilterOutcome {
        self.evaluate(event)
    }
}

/// Filters a raw event payload.
///
/// A payload that cannot be parsed is let through with the parse error as
/// the reason, so that a broken filter never hides an alert.
pub fn filter_payload(filter: &dyn EventFilter, payload: &str) -> FilterOutcome {
    match Event::from_json(payload) {
        Ok(event) => filter.filter(&event),
        Err(e) => {
            tracing::warn!(filter = filter.name(), error = %e, "Could not parse event, letting it through.");
            FilterOutcome::allow(e.to_string())
        }
    }
}
