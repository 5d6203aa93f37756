//! # Webhook Payload Builder
//!
//! Each HTTP transport expects its own JSON shape. The builders here turn a
//! [`Notification`] and the channel it is addressed to into that shape.
//!
//! A builder may decline to produce a payload (HipChat on flapping events,
//! PagerDuty and OpsGenie on statuses they have no action for); the caller
//! reports that as skipped rather than as a failure.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::description::truncate_chars;
use crate::models::{
    event::EventAction,
    notification::{Notification, Severity},
};

/// Longest one-line summary sent to chat transports.
pub const CHAT_SUMMARY_MAX: usize = 400;

/// Longest summary PagerDuty accepts.
const PAGERDUTY_SUMMARY_MAX: usize = 1024;

/// A trait for building channel-specific webhook payloads.
pub trait WebhookPayloadBuilder: Send + Sync {
    /// Builds the payload for `channel`, or `None` when there is nothing to
    /// send for this notification.
    fn build_payload(&self, channel: &str, notification: &Notification) -> Option<Value>;
}

/// A payload builder for Slack incoming webhooks.
///
/// Produces an attachment-style message. The compact form is a single line
/// with the check name linked to the dashboard; the expanded form lists the
/// host, check, status and output as attachment fields.
pub struct SlackPayloadBuilder;

impl SlackPayloadBuilder {
    fn check_link(notification: &Notification) -> String {
        match &notification.dashboard_link {
            Some(link) => format!("<{}|{}>", link, notification.check_name),
            None => notification.check_name.clone(),
        }
    }

    fn field(title: &str, value: impl Into<String>, short: bool) -> Value {
        json!({ "title": title, "value": value.into(), "short": short })
    }

    fn compact(channel: &str, notification: &Notification) -> Value {
        let summary = truncate_chars(&notification.summary, CHAT_SUMMARY_MAX);
        let text = summary.replacen(
            notification.check_name.as_str(),
            &Self::check_link(notification),
            1,
        );
        json!({
            "channel": channel,
            "username": "Sensu",
            "attachments": [{
                "fallback": summary,
                "color": notification.severity.slack_color(),
                "text": text,
            }]
        })
    }

    fn expanded(channel: &str, notification: &Notification) -> Value {
        let problem = notification.severity.is_problem();
        let mut fields = vec![
            Self::field("Hostname", notification.host.as_str(), true),
            Self::field("Check", Self::check_link(notification), true),
            Self::field("Status", notification.severity.as_str(), true),
        ];
        if let (true, Some(runbook)) = (problem, &notification.runbook) {
            fields.push(Self::field("Runbook", runbook.as_str(), true));
        }
        fields.push(Self::field("Check Output", format!("```{}```", notification.output), false));
        if let (true, Some(tip)) = (problem, &notification.tip) {
            fields.push(Self::field("Tip", tip.as_str(), false));
        }

        let mut attachment = json!({
            "fallback": truncate_chars(&notification.summary, CHAT_SUMMARY_MAX),
            "color": notification.severity.slack_color(),
            "title": notification.message.title,
            "fields": fields,
            "footer": "Sensu",
        });
        if let Some(issued) = notification.issued {
            attachment["ts"] = json!(issued);
        }

        json!({
            "channel": channel,
            "username": "Sensu",
            "attachments": [attachment]
        })
    }
}

impl WebhookPayloadBuilder for SlackPayloadBuilder {
    fn build_payload(&self, channel: &str, notification: &Notification) -> Option<Value> {
        Some(if notification.compact {
            Self::compact(channel, notification)
        } else {
            Self::expanded(channel, notification)
        })
    }
}

/// A payload builder for HipChat room notifications. The room itself is part
/// of the request URL, not the payload.
pub struct HipChatPayloadBuilder {
    /// Name shown as the message author.
    pub sender: String,
}

impl HipChatPayloadBuilder {
    fn message(notification: &Notification) -> String {
        let time = notification
            .issued
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now)
            .format("%H:%M:%S");
        format!(
            "<b>{} - {} on {} ({}) - {}</b><br /><br />&nbsp;&nbsp;{}",
            time,
            notification.check_name,
            notification.host,
            notification.address.as_deref().unwrap_or_default(),
            notification.severity,
            notification.output
        )
    }
}

impl WebhookPayloadBuilder for HipChatPayloadBuilder {
    fn build_payload(&self, _channel: &str, notification: &Notification) -> Option<Value> {
        if notification.action == EventAction::Flapping {
            return None;
        }
        Some(json!({
            "from": self.sender,
            "message": Self::message(notification),
            "message_format": "html",
            "color": notification.severity.hipchat_color(),
            "notify": notification.notify,
        }))
    }
}

/// A payload builder for the PagerDuty Events API v2. The channel is the
/// integration's routing key.
pub struct PagerDutyPayloadBuilder;

impl WebhookPayloadBuilder for PagerDutyPayloadBuilder {
    fn build_payload(&self, channel: &str, notification: &Notification) -> Option<Value> {
        match notification.severity {
            Severity::Critical => {
                let mut payload = json!({
                    "routing_key": channel,
                    "event_action": "trigger",
                    "dedup_key": notification.incident_key,
                    "payload": {
                        "summary": truncate_chars(&notification.summary, PAGERDUTY_SUMMARY_MAX),
                        "source": notification.host,
                        "severity": notification.severity.pagerduty_severity(),
                        "component": notification.check_name,
                        "custom_details": notification.details,
                    }
                });
                if let Some(link) = &notification.dashboard_link {
                    payload["links"] = json!([{ "href": link, "text": "Sensu dashboard" }]);
                }
                Some(payload)
            }
            Severity::Ok | Severity::Warning => Some(json!({
                "routing_key": channel,
                "event_action": "resolve",
                "dedup_key": notification.incident_key,
            })),
            Severity::Unknown => {
                tracing::info!(
                    incident_key = %notification.incident_key,
                    "No PagerDuty event action for status UNKNOWN, nothing sent."
                );
                None
            }
        }
    }
}

/// A payload builder for the OpsGenie v1 alert API. The channel is the
/// team's customer key.
///
/// CRITICAL creates an alert, OK and WARNING close it. Both carry the
/// incident key as the alert alias so a close finds its create.
pub struct OpsGeniePayloadBuilder;

impl WebhookPayloadBuilder for OpsGeniePayloadBuilder {
    fn build_payload(&self, channel: &str, notification: &Notification) -> Option<Value> {
        let mut payload = json!({
            "alias": notification.incident_key,
            "customerKey": channel,
            "recipients": notification.recipients,
        });
        match notification.severity {
            Severity::Critical => {
                payload["message"] = json!(truncate_chars(&notification.summary, CHAT_SUMMARY_MAX));
                payload["tags"] = json!("critical");
                payload["details"] = json!(notification.details);
                Some(payload)
            }
            Severity::Ok | Severity::Warning => Some(payload),
            Severity::Unknown => {
                tracing::info!(
                    incident_key = %notification.incident_key,
                    "No OpsGenie action for status UNKNOWN, nothing sent."
                );
                None
            }
        }
    }
}

/// A payload builder for generic webhooks.
///
/// This builder creates a simple, unopinionated JSON payload with the title,
/// body and identifying fields of the notification.
pub struct GenericWebhookPayloadBuilder;

impl WebhookPayloadBuilder for GenericWebhookPayloadBuilder {
    fn build_payload(&self, channel: &str, notification: &Notification) -> Option<Value> {
        Some(json!({
            "channel": channel,
            "title": notification.message.title,
            "body": notification.message.body,
            "severity": notification.severity,
            "action": notification.action,
            "incident_key": notification.incident_key,
        }))
    }
}
