//! # Notification Dispatch
//!
//! This module delivers a formatted [`Notification`] to every channel a
//! handler resolved for an event.
//!
//! ## Core Components
//!
//! - **`Notifier` Trait**: The single operation every transport implements,
//!   `notify(channel, notification)`, reporting whether anything was sent.
//!   Transports may also rewrite the resolved channel list before delivery
//!   (IRC strips `#`).
//! - **`NotificationDispatcher`**: Wraps a notifier with the delivery policy:
//!   a timeout per attempt, a bounded number of attempts and a fixed pause
//!   between them. Channels are notified one after another and a failing
//!   channel never stops delivery to the rest.
//! - **`build_notifier`**: Turns a handler's transport configuration into a
//!   notifier, taking HTTP clients from the shared `HttpClientPool`.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    config::DeliveryPolicy,
    http_client::HttpClientPool,
    models::{
        handler::{
            DEFAULT_HIPCHAT_API_URL, DEFAULT_OPSGENIE_ALERT_URL, DEFAULT_PAGERDUTY_EVENTS_URL,
            HandlerConfig,
        },
        notification::Notification,
        TransportConfig,
    },
};

pub mod description;
pub mod error;
mod http;
mod irc;
pub mod payload_builder;
mod stdout;
pub mod template;
mod webhook;

use error::NotificationError;
pub use http::{ChannelEndpoint, HttpNotifier};
pub use irc::NodebotNotifier;
use payload_builder::{
    GenericWebhookPayloadBuilder, HipChatPayloadBuilder, OpsGeniePayloadBuilder,
    PagerDutyPayloadBuilder, SlackPayloadBuilder,
};
pub use stdout::StdoutNotifier;
pub use webhook::{WebhookClient, WebhookClientConfig};

/// What a transport did with a notification it accepted without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The notification went out.
    Sent,
    /// The transport has nothing to send for this event, with the reason.
    Skipped(String),
}

/// A transport able to deliver a notification to one channel.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &str;

    /// Adjusts the resolved channel names to what the transport expects.
    fn prepare_channels(&self, channels: Vec<String>) -> Vec<String> {
        channels
    }

    /// Delivers `notification` to `channel`.
    async fn notify(
        &self,
        channel: &str,
        notification: &Notification,
    ) -> Result<Delivery, NotificationError>;
}

/// Outcome of delivering one notification to a set of channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Channels that accepted the notification.
    pub delivered: Vec<String>,
    /// Channels the transport had nothing to send to, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Channels that did not, with the last error seen.
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    /// True when no channel failed. Skipped channels do not count as failures.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers notifications through a [`Notifier`] under a [`DeliveryPolicy`].
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    policy: DeliveryPolicy,
}

impl NotificationDispatcher {
    /// Wraps `notifier` with `policy`.
    pub fn new(notifier: Arc<dyn Notifier>, policy: DeliveryPolicy) -> Self {
        Self { notifier, policy }
    }

    /// The wrapped transport.
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Delivers to a single channel, retrying failed attempts.
    ///
    /// Non-retryable errors end the loop immediately.
    pub async fn deliver(
        &self,
        channel: &str,
        notification: &Notification,
    ) -> Result<Delivery, NotificationError> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(
                self.policy.attempt_timeout_secs,
                self.notifier.notify(channel, notification),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(self.policy.attempt_timeout_secs)),
            };

            match result {
                Ok(delivery) => return Ok(delivery),
                Err(e) if attempt >= attempts || !e.is_retryable() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        transport = self.notifier.name(),
                        channel,
                        attempt,
                        error = %e,
                        "Delivery attempt failed, retrying."
                    );
                    tokio::time::sleep(self.policy.backoff_secs).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Delivers to every channel in order and reports the result per channel.
    pub async fn dispatch(&self, channels: &[String], notification: &Notification) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for channel in channels {
            match self.deliver(channel, notification).await {
                Ok(Delivery::Skipped(reason)) => {
                    tracing::info!(
                        transport = self.notifier.name(),
                        channel = %channel,
                        incident_key = %notification.incident_key,
                        reason = %reason,
                        "Nothing sent to channel."
                    );
                    report.skipped.push((channel.clone(), reason));
                }
                Ok(Delivery::Sent) => {
                    tracing::info!(
                        transport = self.notifier.name(),
                        channel = %channel,
                        incident_key = %notification.incident_key,
                        "Notification delivered."
                    );
                    report.delivered.push(channel.clone());
                }
                Err(e) => {
                    tracing::error!(
                        transport = self.notifier.name(),
                        channel = %channel,
                        incident_key = %notification.incident_key,
                        error = %e,
                        "Failed to deliver notification."
                    );
                    report.failed.push((channel.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

/// Creates the notifier for `handler`'s transport.
pub async fn build_notifier(
    handler: &HandlerConfig,
    client_pool: &HttpClientPool,
) -> Result<Arc<dyn Notifier>, NotificationError> {
    let notifier: Arc<dyn Notifier> = match &handler.transport {
        TransportConfig::Stdout(_) => Arc::new(StdoutNotifier),
        TransportConfig::Nodebot(c) => Arc::new(NodebotNotifier::new(c.command.clone())),
        TransportConfig::Slack(c) => Arc::new(HttpNotifier::new(
            "slack",
            ChannelEndpoint::Fixed(WebhookClientConfig {
                url: c.webhook_url.to_string(),
                ..Default::default()
            }),
            Box::new(SlackPayloadBuilder),
            client_pool.get_or_create(&c.retry_policy).await?,
        )),
        TransportConfig::Hipchat(c) => Arc::new(HttpNotifier::new(
            "hipchat",
            ChannelEndpoint::HipChatRoom {
                api_url: c
                    .api_url
                    .as_ref()
                    .map_or_else(|| DEFAULT_HIPCHAT_API_URL.to_string(), |u| u.to_string()),
                api_key: c.api_key.clone(),
            },
            Box::new(HipChatPayloadBuilder { sender: c.sender.clone() }),
            client_pool.get_or_create(&c.retry_policy).await?,
        )),
        TransportConfig::Pagerduty(c) => Arc::new(HttpNotifier::new(
            "pagerduty",
            ChannelEndpoint::Fixed(WebhookClientConfig {
                url: c
                    .events_url
                    .as_ref()
                    .map_or_else(|| DEFAULT_PAGERDUTY_EVENTS_URL.to_string(), |u| u.to_string()),
                ..Default::default()
            }),
            Box::new(PagerDutyPayloadBuilder),
            client_pool.get_or_create(&c.retry_policy).await?,
        )),
        TransportConfig::Opsgenie(c) => Arc::new(HttpNotifier::new(
            "opsgenie",
            ChannelEndpoint::OpsGenieAlert {
                api_url: c
                    .api_url
                    .as_ref()
                    .map_or_else(|| DEFAULT_OPSGENIE_ALERT_URL.to_string(), |u| u.to_string()),
            },
            Box::new(OpsGeniePayloadBuilder),
            client_pool.get_or_create(&c.retry_policy).await?,
        )),
        TransportConfig::Webhook(c) => Arc::new(HttpNotifier::new(
            "webhook",
            ChannelEndpoint::Fixed(WebhookClientConfig {
                url: c.url.to_string(),
                url_params: None,
                method: c.method.clone(),
                secret: c.secret.clone(),
                headers: c.headers.clone(),
            }),
            Box::new(GenericWebhookPayloadBuilder),
            client_pool.get_or_create(&c.retry_policy).await?,
        )),
    };

    tracing::debug!(handler = %handler.name, transport = notifier.name(), "Built notifier.");
    Ok(notifier)
}
