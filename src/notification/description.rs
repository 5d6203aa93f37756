//! Human-readable renderings of an event.

use std::{borrow::Cow, collections::BTreeMap, sync::LazyLock};

use chrono::DateTime;
use regex::Regex;

use crate::{
    config::AppConfig,
    models::{
        event::{Event, EventAction},
        notification::{Notification, NotificationMessage},
    },
};

/// ANSI SGR colour sequences as emitted by check scripts.
static COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[(?:(?:[349]|10)[0-7]|[0-9]|[34]8;5;\d{1,3})?m")
        .expect("colour sequence pattern is a valid regex")
});

/// Removes terminal colour codes from check output.
pub fn uncolorize(input: &str) -> Cow<'_, str> {
    COLOR_REGEX.replace_all(input, "")
}

/// Keeps at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Renders a check's `issued` timestamp.
pub fn format_timestamp(issued: Option<i64>) -> String {
    issued
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Formats events into descriptions and notifications.
#[derive(Debug, Clone, Default)]
pub struct EventFormatter {
    dashboard_link: Option<String>,
    datacenter: Option<String>,
}

impl EventFormatter {
    /// Creates a formatter with an optional dashboard and datacenter.
    pub fn new(dashboard_link: Option<String>, datacenter: Option<String>) -> Self {
        Self { dashboard_link, datacenter }
    }

    /// Creates a formatter from the global settings.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.dashboard_link.clone(), config.datacenter.clone())
    }

    /// Link to the check on the dashboard, if a dashboard is configured.
    pub fn dashboard_link(&self, event: &Event) -> Option<String> {
        let base = self.dashboard_link.as_deref()?.trim_end_matches('/');
        Some(format!(
            "{}/#/client/{}/{}?check={}",
            base,
            self.datacenter.as_deref().unwrap_or_default(),
            event.client.name,
            event.check.name
        ))
    }

    /// One-line description of the event, at most `maxlen` characters.
    ///
    /// The check's `notification` attribute replaces the generated
    /// `host : check : output` text. Warnings and criticals get the tip and
    /// runbook appended.
    pub fn description(&self, event: &Event, maxlen: usize) -> String {
        let check = &event.check;
        let mut description = match &check.notification {
            Some(notification) => notification.clone(),
            None => [
                event.client.display_name(),
                check.name.as_str(),
                &*uncolorize(check.output()),
            ]
            .join(" : "),
        };

        if check.severity().is_problem() {
            if let Some(tip) = &check.tip {
                description.push_str(&format!(" - {tip}"));
            }
            if let Some(runbook) = &check.runbook {
                description.push_str(&format!(" ({runbook})"));
            }
        }

        truncate_chars(&description.replace('\n', " "), maxlen)
    }

    /// Multi-line description carrying everything an on-call engineer needs.
    pub fn full_description(&self, event: &Event) -> String {
        let check = &event.check;
        let severity = check.severity();
        format!(
            "{output}\n\n\
             Dashboard Link: {dashboard}\n\
             Runbook: {runbook}\n\
             Tip: {tip}\n\n\
             Command:  {command}\n\
             Status: {severity} ({status})\n\n\
             Timestamp: {timestamp}\n\
             Occurrences:  {occurrences}\n\n\
             Team: {team}\n\
             Host: {host}\n\
             Address:  {address}\n\
             Check Name:  {check_name}\n",
            output = uncolorize(check.output()),
            dashboard = self.dashboard_link(event).unwrap_or_default(),
            runbook = check.runbook.as_deref().unwrap_or_default(),
            tip = check.tip.as_deref().unwrap_or_default(),
            command = check.command.as_deref().unwrap_or_default(),
            status = check.status,
            timestamp = format_timestamp(check.issued),
            occurrences = event.occurrences,
            team = event.team_name().unwrap_or_default(),
            host = event.client.name,
            address = event.client.address.as_deref().unwrap_or_default(),
            check_name = check.name,
        )
    }

    /// The full description as key/value pairs, for transports with
    /// structured details. Empty values are left out.
    pub fn details(&self, event: &Event) -> BTreeMap<String, String> {
        let check = &event.check;
        let entries = [
            ("Output", Some(uncolorize(check.output()).into_owned())),
            ("Dashboard Link", self.dashboard_link(event)),
            ("Host", Some(event.client.name.clone())),
            ("Timestamp", check.issued.map(|issued| format_timestamp(Some(issued)))),
            ("Address", event.client.address.clone()),
            ("Check Name", Some(check.name.clone())),
            ("Command", check.command.clone()),
            ("Status", Some(format!("{} ({})", check.severity(), check.status))),
            ("Occurrences", Some(event.occurrences.to_string())),
            ("Team", check.team.clone()),
            ("Runbook", check.runbook.clone()),
            ("Tip", check.tip.clone()),
        ];

        entries
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key.to_string(), v)))
            .collect()
    }

    /// Builds the notification handed to every transport.
    pub fn notification(&self, event: &Event) -> Notification {
        let check = &event.check;
        let severity = check.severity();
        let host = event.client.display_name().to_string();

        Notification {
            message: NotificationMessage {
                title: format!("{} on {} - {}", check.name, host, severity),
                body: self.full_description(event),
            },
            summary: self.description(event, usize::MAX),
            severity,
            notify: event.action == EventAction::Create,
            action: event.action,
            incident_key: event.incident_key(),
            host,
            address: event.client.address.clone(),
            check_name: check.name.clone(),
            output: uncolorize(check.output()).into_owned(),
            issued: check.issued,
            runbook: check.runbook.clone(),
            tip: check.tip.clone(),
            dashboard_link: self.dashboard_link(event),
            details: self.details(event),
            compact: false,
            recipients: None,
        }
    }
}
