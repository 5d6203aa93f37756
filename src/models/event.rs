//! Read-only view over a Sensu event as delivered to a handler on stdin.
//!
//! Sensu payloads are loosely typed: numbers arrive as strings, flags as
//! `"true"`, optional fields as `null` or missing entirely. Every field here
//! is coerced on the way in so that downstream logic can stay total.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{
    config::{
        coerce_int, deserialize_flag, deserialize_lenient_int, deserialize_lenient_opt_int,
        deserialize_lenient_opt_string,
    },
    models::notification::Severity,
};

/// Name of the check Sensu synthesizes for client heartbeats.
pub const KEEPALIVE_CHECK: &str = "keepalive";

/// Lifecycle phase of the check result behind an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    /// The check is failing.
    #[default]
    Create,
    /// The check recovered.
    Resolve,
    /// The check keeps changing state.
    Flapping,
}

impl EventAction {
    /// Returns the lowercase name Sensu uses for the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Create => "create",
            EventAction::Resolve => "resolve",
            EventAction::Flapping => "flapping",
        }
    }
}

/// A single monitoring event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Event {
    /// The client (host) the check ran on.
    #[serde(default)]
    pub client: Client,

    /// The check definition merged with its latest result.
    #[serde(default)]
    pub check: Check,

    /// Consecutive identical results, including this one. Always at least 1.
    #[serde(default = "default_occurrences", deserialize_with = "deserialize_occurrences")]
    pub occurrences: i64,

    /// Highest occurrence count reached before the check flipped back to OK.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_int")]
    pub occurrences_watermark: Option<i64>,

    /// Lifecycle phase of the result.
    #[serde(default)]
    pub action: EventAction,
}

fn default_occurrences() -> i64 {
    1
}

impl Default for Event {
    fn default() -> Self {
        Self {
            client: Client::default(),
            check: Check::default(),
            occurrences: default_occurrences(),
            occurrences_watermark: None,
            action: EventAction::default(),
        }
    }
}

fn deserialize_occurrences<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_int(&value).max(1))
}

impl Event {
    /// Parses an event from its JSON representation.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Identifies the incident this event belongs to, `client/check`.
    pub fn incident_key(&self) -> String {
        format!("{}/{}", self.client.name, self.check.name)
    }

    /// The owning team, if the check declares one.
    pub fn team_name(&self) -> Option<&str> {
        self.check.team.as_deref()
    }

    /// Whether the check asks to page its team.
    pub fn should_page(&self) -> bool {
        self.check.page
    }
}

/// The client section of an event.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Client {
    /// Client name as registered with Sensu.
    #[serde(default)]
    pub name: String,

    /// Client address.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub address: Option<String>,

    /// Free-form client tags.
    #[serde(default)]
    pub tags: Map<String, Value>,
}

impl Client {
    /// The `Display Name` tag when present and non-empty, the client name
    /// otherwise.
    pub fn display_name(&self) -> &str {
        match self.tags.get("Display Name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}

/// The check section of an event.
///
/// Fields the handlers know about are typed; everything else (channel
/// overrides and the like) is kept in `extra` and looked up by name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Check {
    /// Check name.
    #[serde(default)]
    pub name: String,

    /// Exit status of the check command.
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub status: i64,

    /// Seconds between two executions; 0 for passive checks.
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub interval: i64,

    /// Seconds of continuous failure before the first notification.
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub alert_after: i64,

    /// Occurrence cadence for repeated notifications, -1 for exponential
    /// backoff. Absent means every occurrence.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_int")]
    pub realert_every: Option<i64>,

    /// Replaces `alert_after` for paging handlers.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_int")]
    pub page_after: Option<i64>,

    /// Whether the check pages its team.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub page: bool,

    /// The owning team.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub team: Option<String>,

    /// Link to the runbook for this check.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub runbook: Option<String>,

    /// Short remediation hint.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub tip: Option<String>,

    /// Replaces the generated one-line description.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub notification: Option<String>,

    /// Output of the check command.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub output: Option<String>,

    /// The check command line.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub command: Option<String>,

    /// Unix timestamp of the execution.
    #[serde(default, deserialize_with = "deserialize_lenient_opt_int")]
    pub issued: Option<i64>,

    /// Any other attribute of the check definition.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Check {
    /// Looks up an untyped check attribute.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Severity derived from the exit status.
    pub fn severity(&self) -> Severity {
        Severity::from_status(self.status)
    }

    /// Check output, empty when the check reported none.
    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_minimal_event_defaults() {
        let event = Event::from_json("{}").unwrap();
        assert_eq!(event.occurrences, 1);
        assert_eq!(event.action, EventAction::Create);
        assert_eq!(event.check.interval, 0);
        assert_eq!(event.check.realert_every, None);
        assert!(!event.should_page());
        assert!(event.team_name().is_none());
    }

    #[test]
    fn test_event_coerces_loose_fields() {
        let event = Event::from_json(
            r##"{
                "action": "resolve",
                "occurrences": "7",
                "occurrences_watermark": 12,
                "client": {"name": "web1", "address": "10.0.0.1"},
                "check": {
                    "name": "disk",
                    "status": "2",
                    "interval": "60",
                    "alert_after": "ten",
                    "realert_every": "-1",
                    "page": "true",
                    "team": "operations",
                    "irc_channels": ["#ops"]
                }
            }"##,
        )
        .unwrap();

        assert_eq!(event.action, EventAction::Resolve);
        assert_eq!(event.occurrences, 7);
        assert_eq!(event.occurrences_watermark, Some(12));
        assert_eq!(event.check.status, 2);
        assert_eq!(event.check.interval, 60);
        assert_eq!(event.check.alert_after, 0);
        assert_eq!(event.check.realert_every, Some(-1));
        assert!(event.should_page());
        assert_eq!(event.team_name(), Some("operations"));
        assert_eq!(event.check.field("irc_channels"), Some(&json!(["#ops"])));
        assert_eq!(event.check.severity(), Severity::Critical);
        assert_eq!(event.incident_key(), "web1/disk");
    }

    #[test]
    fn test_occurrences_never_below_one() {
        let event = Event::from_json(r#"{"occurrences": 0}"#).unwrap();
        assert_eq!(event.occurrences, 1);
        let event = Event::from_json(r#"{"occurrences": "garbage"}"#).unwrap();
        assert_eq!(event.occurrences, 1);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Event::from_json(r#"{"action": "explode"}"#).is_err());
    }

    #[test]
    fn test_display_name_prefers_tag() {
        let mut client = Client { name: "i-123".to_string(), ..Default::default() };
        assert_eq!(client.display_name(), "i-123");

        client.tags.insert("Display Name".to_string(), json!(""));
        assert_eq!(client.display_name(), "i-123");

        client.tags.insert("Display Name".to_string(), json!("db-primary"));
        assert_eq!(client.display_name(), "db-primary");
    }
}
