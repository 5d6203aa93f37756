use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{deserialize_duration_from_seconds, serialize_duration_to_seconds};

fn default_attempts() -> u32 {
    3
}

fn default_attempt_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff() -> Duration {
    Duration::from_secs(3)
}

/// How hard the dispatcher tries to deliver one notification to one channel.
///
/// Every attempt is bounded by `attempt_timeout_secs`; between failed attempts
/// the dispatcher sleeps for a fixed `backoff_secs`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// Total number of attempts, including the first one. Zero is treated as one.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Upper bound for a single attempt.
    #[serde(
        default = "default_attempt_timeout",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub attempt_timeout_secs: Duration,

    /// Fixed pause between two attempts.
    #[serde(
        default = "default_backoff",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub backoff_secs: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            attempt_timeout_secs: default_attempt_timeout(),
            backoff_secs: default_backoff(),
        }
    }
}
