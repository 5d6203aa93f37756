//! Transports that deliver over HTTP: Slack, HipChat, PagerDuty, OpsGenie and
//! generic webhooks. They differ only in where the request goes and in the payload
//! shape, so one notifier drives all of them.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;

use super::{
    Delivery, Notifier,
    error::NotificationError,
    payload_builder::WebhookPayloadBuilder,
    webhook::{WebhookClient, WebhookClientConfig},
};
use crate::models::notification::{Notification, Severity};

/// Where requests for a channel are sent.
#[derive(Debug, Clone)]
pub enum ChannelEndpoint {
    /// Every channel posts to the same endpoint; the channel travels in the
    /// payload.
    Fixed(WebhookClientConfig),
    /// One endpoint per HipChat room.
    HipChatRoom {
        /// API base URL, ending with a slash.
        api_url: String,
        /// Room notification token.
        api_key: String,
    },
    /// OpsGenie alerts: creates post to the base URL, closes to `{url}/close`.
    OpsGenieAlert {
        /// Alert API base URL.
        api_url: String,
    },
}

impl ChannelEndpoint {
    /// The request configuration for delivering `notification` to `channel`.
    pub fn client_config(&self, channel: &str, notification: &Notification) -> WebhookClientConfig {
        match self {
            ChannelEndpoint::Fixed(config) => config.clone(),
            ChannelEndpoint::HipChatRoom { api_url, api_key } => WebhookClientConfig {
                url: format!(
                    "{}/room/{}/notification",
                    api_url.trim_end_matches('/'),
                    urlencoding::encode(channel)
                ),
                url_params: Some(HashMap::from([("auth_token".to_string(), api_key.clone())])),
                method: Some("POST".to_string()),
                ..Default::default()
            },
            ChannelEndpoint::OpsGenieAlert { api_url } => {
                let base = api_url.trim_end_matches('/');
                let url = if notification.severity == Severity::Critical {
                    base.to_string()
                } else {
                    format!("{base}/close")
                };
                WebhookClientConfig { url, ..Default::default() }
            }
        }
    }
}

/// Delivers notifications as JSON over HTTP.
pub struct HttpNotifier {
    name: &'static str,
    endpoint: ChannelEndpoint,
    builder: Box<dyn WebhookPayloadBuilder>,
    http_client: Arc<ClientWithMiddleware>,
}

impl HttpNotifier {
    /// Creates a transport named `name` that posts `builder` payloads to
    /// `endpoint`.
    pub fn new(
        name: &'static str,
        endpoint: ChannelEndpoint,
        builder: Box<dyn WebhookPayloadBuilder>,
        http_client: Arc<ClientWithMiddleware>,
    ) -> Self {
        Self { name, endpoint, builder, http_client }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn name(&self) -> &str {
        self.name
    }

    async fn notify(
        &self,
        channel: &str,
        notification: &Notification,
    ) -> Result<Delivery, NotificationError> {
        let Some(payload) = self.builder.build_payload(channel, notification) else {
            tracing::debug!(
                transport = self.name,
                channel,
                incident_key = %notification.incident_key,
                "Nothing to send for this notification."
            );
            return Ok(Delivery::Skipped(format!(
                "{} sends nothing for a {} {} event",
                self.name,
                notification.severity,
                notification.action.as_str()
            )));
        };

        let client =
            WebhookClient::new(self.endpoint.client_config(channel, notification), self.http_client.clone())?;
        client.notify_json(&payload).await?;
        Ok(Delivery::Sent)
    }
}
