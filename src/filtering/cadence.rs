//! The occurrence-count cadence policy.
//!
//! A failing check re-reports the same status on every execution. This policy
//! decides which of those repeats reach a human: nothing until the check has
//! been failing for `alert_after` seconds, then either every `realert_every`-th
//! occurrence or, with `realert_every = -1`, occurrences on a power of two.

use crate::models::event::{Event, EventAction, KEEPALIVE_CHECK};

use super::{FilterOutcome, FilterVariant};

/// Interval Sensu clients use for keepalive heartbeats, in seconds.
pub const KEEPALIVE_INTERVAL: i64 = 20;

/// `realert_every` value selecting exponential backoff.
pub const EXPONENTIAL_BACKOFF: i64 = -1;

/// The numbers the cadence decision is computed from, normalised from the
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceParams {
    /// Seconds between executions, never negative.
    pub interval: i64,
    /// Seconds of failure before the first notification, never negative.
    pub alert_after: i64,
    /// Occurrence cadence, never 0. [`EXPONENTIAL_BACKOFF`] selects
    /// exponential backoff; any other value is a fixed cadence.
    pub realert_every: i64,
    /// Occurrences swallowed by the `alert_after` threshold.
    pub initial_failing_occurrences: i64,
    /// Occurrences past the threshold, counting from 1.
    pub number_of_failed_attempts: i64,
}

impl CadenceParams {
    /// Extracts the cadence parameters of `event` for the given variant.
    pub fn from_event(event: &Event, variant: FilterVariant) -> Self {
        let check = &event.check;

        let interval =
            if check.name == KEEPALIVE_CHECK { KEEPALIVE_INTERVAL } else { check.interval.max(0) };

        let alert_after = match variant {
            FilterVariant::Paging => check.page_after.unwrap_or(check.alert_after),
            FilterVariant::Standard => check.alert_after,
        }
        .max(0);

        let realert_every = match check.realert_every.unwrap_or(1) {
            0 => EXPONENTIAL_BACKOFF,
            n => n,
        };

        let initial_failing_occurrences = if interval > 0 { alert_after / interval } else { 0 };

        Self {
            interval,
            alert_after,
            realert_every,
            initial_failing_occurrences,
            number_of_failed_attempts: event.occurrences - initial_failing_occurrences,
        }
    }

    /// Whether repeats are throttled exponentially rather than at a fixed
    /// cadence.
    pub fn is_exponential(&self) -> bool {
        self.realert_every == EXPONENTIAL_BACKOFF
    }
}

/// Returns true for 1, 2, 4, 8, 16 and so on.
pub fn is_power_of_two(n: i64) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// Decides whether an event should be handled.
///
/// The filter is a pure function of the event: it never fails and keeps no
/// state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CadenceFilter {
    variant: FilterVariant,
}

impl CadenceFilter {
    /// Creates a filter for `variant`.
    pub fn new(variant: FilterVariant) -> Self {
        Self { variant }
    }

    /// The filter used by chat, IRC and webhook handlers.
    pub fn standard() -> Self {
        Self::new(FilterVariant::Standard)
    }

    /// The filter used by paging handlers, honouring `page_after`.
    pub fn paging() -> Self {
        Self::new(FilterVariant::Paging)
    }

    /// Which `alert_after` source this filter reads.
    pub fn variant(&self) -> FilterVariant {
        self.variant
    }

    /// Evaluates the cadence policy for `event`.
    pub fn evaluate(&self, event: &Event) -> FilterOutcome {
        let params = CadenceParams::from_event(event, self.variant);
        let failed = params.number_of_failed_attempts;

        // A resolve must go out whenever the failure was long enough to have
        // alerted, even if the create itself was throttled.
        if event.action == EventAction::Resolve {
            if let Some(watermark) = event.occurrences_watermark {
                if watermark > params.initial_failing_occurrences {
                    return FilterOutcome::allow(format!(
                        "resolving after {} failing occurrences, past the {} initial failing \
                         occurrences",
                        watermark, params.initial_failing_occurrences
                    ));
                }
            }
        }

        if failed < 1 {
            return FilterOutcome::suppress(format!(
                "Not failing long enough, only {} after {} initial failing occurrences",
                failed, params.initial_failing_occurrences
            ));
        }

        if params.interval > 0 && event.action == EventAction::Create {
            if params.is_exponential() {
                return if is_power_of_two(failed) {
                    FilterOutcome::allow(format!("can be processed now: {}", failed))
                } else {
                    FilterOutcome::suppress(format!("not on a power of two: {}", failed))
                };
            }

            if (failed - 1) % params.realert_every != 0 {
                return FilterOutcome::suppress(format!(
                    "only handling every {} occurrences, and we are at {}",
                    params.realert_every, failed
                ));
            }
        }

        FilterOutcome::allow(format!("can be processed now: {}", failed))
    }
}
