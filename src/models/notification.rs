//! Data models for notifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::event::EventAction;

/// A message to be sent in a notification, with a title and body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NotificationMessage {
    /// The title of the notification message.
    pub title: String,
    /// The body content of the notification message.
    pub body: String,
}

/// Severity of a check result, derived from its exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Exit status 0.
    Ok,
    /// Exit status 1.
    Warning,
    /// Exit status 2.
    Critical,
    /// Any other exit status.
    Unknown,
}

impl Severity {
    /// Maps a Nagios-style exit status to a severity.
    pub fn from_status(status: i64) -> Self {
        match status {
            0 => Severity::Ok,
            1 => Severity::Warning,
            2 => Severity::Critical,
            _ => Severity::Unknown,
        }
    }

    /// Upper-case name used in titles and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Whether the result is a warning or worse, excluding unknown.
    pub fn is_problem(&self) -> bool {
        matches!(self, Severity::Warning | Severity::Critical)
    }

    /// Slack attachment colour.
    pub fn slack_color(&self) -> &'static str {
        match self {
            Severity::Ok => "good",
            Severity::Warning => "warning",
            Severity::Critical => "danger",
            Severity::Unknown => "#aaaaaa",
        }
    }

    /// HipChat message colour.
    pub fn hipchat_color(&self) -> &'static str {
        match self {
            Severity::Ok => "green",
            Severity::Warning => "yellow",
            Severity::Critical => "red",
            Severity::Unknown => "grey",
        }
    }

    /// mIRC colour code understood by nodebot.
    pub fn irc_color(&self) -> u8 {
        match self {
            Severity::Ok => 9,
            Severity::Warning => 8,
            Severity::Critical => 4,
            Severity::Unknown => 7,
        }
    }

    /// PagerDuty Events v2 severity.
    pub fn pagerduty_severity(&self) -> &'static str {
        match self {
            Severity::Ok => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
            Severity::Unknown => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A formatted notification, ready to be handed to a transport.
///
/// Built once per event by the handler pipeline and shared by every channel
/// the event is delivered to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Title and body of the message.
    pub message: NotificationMessage,
    /// One-line description used by chat transports.
    pub summary: String,
    /// Severity derived from the check status.
    pub severity: Severity,
    /// Whether the transport should actively alert the recipient.
    pub notify: bool,
    /// Lifecycle phase of the event.
    pub action: EventAction,
    /// `client/check`, stable across the lifetime of an incident.
    pub incident_key: String,
    /// Display name of the client.
    pub host: String,
    /// Client address, when it reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Name of the check.
    pub check_name: String,
    /// Check output with terminal colour codes removed.
    pub output: String,
    /// Unix time the check ran, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<i64>,
    /// Runbook link from the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook: Option<String>,
    /// Short hint from the check for whoever is on call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    /// Link to the check on the monitoring dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_link: Option<String>,
    /// Extra key/value details for transports that support them.
    #[serde(default)]
    pub details: BTreeMap<String, String>,
    /// Prefer a condensed rendering where the transport has one.
    #[serde(default)]
    pub compact: bool,
    /// People or groups to alert, for transports that address recipients
    /// rather than channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_status() {
        assert_eq!(Severity::from_status(0), Severity::Ok);
        assert_eq!(Severity::from_status(1), Severity::Warning);
        assert_eq!(Severity::from_status(2), Severity::Critical);
        assert_eq!(Severity::from_status(3), Severity::Unknown);
        assert_eq!(Severity::from_status(-1), Severity::Unknown);
    }

    #[test]
    fn test_severity_transport_colors() {
        assert_eq!(Severity::Ok.slack_color(), "good");
        assert_eq!(Severity::Critical.slack_color(), "danger");
        assert_eq!(Severity::Unknown.slack_color(), "#aaaaaa");
        assert_eq!(Severity::Warning.hipchat_color(), "yellow");
        assert_eq!(Severity::Unknown.hipchat_color(), "grey");
        assert_eq!(Severity::Ok.irc_color(), 9);
        assert_eq!(Severity::Critical.irc_color(), 4);
        assert_eq!(Severity::Critical.pagerduty_severity(), "critical");
    }

    #[test]
    fn test_severity_is_problem() {
        assert!(Severity::Warning.is_problem());
        assert!(Severity::Critical.is_problem());
        assert!(!Severity::Ok.is_problem());
        assert!(!Severity::Unknown.is_problem());
    }
}
