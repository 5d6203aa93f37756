//! # Event Handler
//!
//! Runs one Sensu event through a configured handler:
//!
//! 1. The cadence filter decides whether this occurrence is worth a message.
//! 2. The event's team is looked up; events without a team are dropped.
//! 3. Paging transports only act on checks that page. OpsGenie also needs
//!    the team's recipients.
//! 4. The channel resolver picks the channels, which the transport may
//!    rewrite.
//! 5. The event is formatted once and delivered to every channel.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use crate::{
    channels::ChannelResolver,
    config::AppConfig,
    filtering::{CadenceFilter, EventFilter},
    http_client::HttpClientPool,
    models::{
        event::Event,
        handler::{HandlerConfig, TransportConfig},
        notification::Notification,
    },
    notification::{
        DeliveryReport, NotificationDispatcher, Notifier, build_notifier,
        description::EventFormatter,
        error::NotificationError,
        template::{TemplateService, TemplateServiceError},
    },
};

/// Errors that abort handling of an event.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The event payload is not a valid event.
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    /// The transport could not be set up.
    #[error("Notifier error: {0}")]
    Notifier(#[from] NotificationError),

    /// The handler's message template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] TemplateServiceError),
}

/// What happened to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The cadence filter held the event back.
    Suppressed {
        /// Reason given by the filter.
        reason: String,
    },
    /// The event passed the filter but there was nothing to do with it.
    Skipped {
        /// Why nothing was sent.
        reason: String,
    },
    /// The event was delivered, fully or partially.
    Dispatched(DeliveryReport),
}

impl std::fmt::Display for HandleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleOutcome::Suppressed { reason } => write!(f, "suppressed: {reason}"),
            HandleOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
            HandleOutcome::Dispatched(report) => {
                write!(f, "delivered to [{}]", report.delivered.join(", "))?;
                for (channel, reason) in &report.skipped {
                    write!(f, "; skipped {channel}: {reason}")?;
                }
                for (channel, error) in &report.failed {
                    write!(f, "; failed {channel}: {error}")?;
                }
                Ok(())
            }
        }
    }
}

/// A configured handler, ready to process events.
pub struct EventHandler {
    config: HandlerConfig,
    filter: CadenceFilter,
    resolver: ChannelResolver,
    formatter: EventFormatter,
    templates: TemplateService,
    dispatcher: NotificationDispatcher,
}

impl EventHandler {
    /// Creates a handler delivering through `notifier`.
    pub fn new(
        config: HandlerConfig,
        formatter: EventFormatter,
        notifier: Arc<dyn Notifier>,
        app_config: &AppConfig,
    ) -> Self {
        Self {
            filter: CadenceFilter::new(config.filter_variant()),
            resolver: ChannelResolver::for_handler(&config),
            formatter,
            templates: TemplateService::new(),
            dispatcher: NotificationDispatcher::new(notifier, app_config.delivery.clone()),
            config,
        }
    }

    /// Creates a handler with the transport its configuration names.
    pub async fn from_config(
        config: HandlerConfig,
        app_config: &AppConfig,
        client_pool: &HttpClientPool,
    ) -> Result<Self, HandlerError> {
        let notifier = build_notifier(&config, client_pool).await?;
        Ok(Self::new(config, EventFormatter::from_config(app_config), notifier, app_config))
    }

    /// Name of the handler as configured.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Parses `payload` and handles the event.
    pub async fn handle_payload(&self, payload: &str) -> Result<HandleOutcome, HandlerError> {
        let event = Event::from_json(payload)?;
        self.handle(&event).await
    }

    /// Handles one event.
    pub async fn handle(&self, event: &Event) -> Result<HandleOutcome, HandlerError> {
        let outcome = self.filter.filter(event);
        if !outcome.is_allowed() {
            tracing::debug!(
                handler = %self.config.name,
                incident_key = %event.incident_key(),
                reason = %outcome.reason,
                "Event suppressed."
            );
            return Ok(HandleOutcome::Suppressed { reason: outcome.reason });
        }

        let Some(team_name) = event.team_name() else {
            tracing::error!(
                handler = %self.config.name,
                incident_key = %event.incident_key(),
                "Check has no team, cannot route the event."
            );
            return Ok(HandleOutcome::Skipped { reason: "check has no team".to_string() });
        };

        if self.config.transport.is_paging() && !event.should_page() {
            return Ok(HandleOutcome::Skipped {
                reason: "check does not page".to_string(),
            });
        }

        let team = self.config.teams.team_data(team_name);
        if matches!(self.config.transport, TransportConfig::Opsgenie(_))
            && team.opsgenie_recipients.is_none()
        {
            tracing::error!(
                handler = %self.config.name,
                team = team_name,
                "Team has no OpsGenie recipients."
            );
            return Ok(HandleOutcome::Skipped {
                reason: format!("no opsgenie recipients for team {team_name}"),
            });
        }
        let channels =
            self.dispatcher.notifier().prepare_channels(self.resolver.resolve(event, &team));
        if channels.is_empty() {
            tracing::warn!(
                handler = %self.config.name,
                team = team_name,
                incident_key = %event.incident_key(),
                "No channels configured for team."
            );
            return Ok(HandleOutcome::Skipped {
                reason: format!("no channels for team {team_name}"),
            });
        }

        let mut notification = self.formatter.notification(event);
        notification.compact = team.slack_compact_message.unwrap_or(false);
        notification.recipients = team.opsgenie_recipients.clone();
        self.apply_message_template(event, &mut notification)?;

        tracing::debug!(
            handler = %self.config.name,
            channels = ?channels,
            incident_key = %notification.incident_key,
            "Dispatching notification."
        );
        let report = self.dispatcher.dispatch(&channels, &notification).await;
        Ok(HandleOutcome::Dispatched(report))
    }

    /// Replaces the generated title and body with the handler's template,
    /// rendered against the event and the generated fields.
    fn apply_message_template(
        &self,
        event: &Event,
        notification: &mut Notification,
    ) -> Result<(), HandlerError> {
        let Some(message) = &self.config.message else {
            return Ok(());
        };

        let context = template_context(event, notification);
        notification.message.title = self.templates.render(&message.title, context.clone())?;
        notification.message.body = self.templates.render(&message.body, context)?;
        Ok(())
    }
}

/// Context for message templates. Keys match
/// [`crate::notification::template::MESSAGE_CONTEXT_KEYS`].
fn template_context(event: &Event, notification: &Notification) -> serde_json::Value {
    json!({
        "client": event.client,
        "check": event.check,
        "occurrences": event.occurrences,
        "action": event.action,
        "summary": notification.summary,
        "severity": notification.severity,
        "incident_key": notification.incident_key,
        "dashboard_link": notification.dashboard_link,
        "details": notification.details,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_helpers::{EventBuilder, HandlerBuilder, RecordingNotifier};

    fn handler(config: HandlerConfig, notifier: RecordingNotifier) -> EventHandler {
        EventHandler::new(
            config,
            EventFormatter::default(),
            Arc::new(notifier),
            &AppConfig::default(),
        )
    }

    fn ops_event() -> EventBuilder {
        EventBuilder::new()
            .client_name("web1")
            .check_name("disk_free")
            .status(2)
            .team("ops")
            .interval(60)
    }

    #[tokio::test]
    async fn test_suppressed_event_is_not_delivered() {
        let notifier = RecordingNotifier::new();
        let config =
            HandlerBuilder::new("slack").team_json("ops", json!({"slack_channels": "#ops"})).build();
        let handler = handler(config, notifier.clone());

        let event = ops_event().interval(20).realert_every(-1).occurrences(5).build();
        let outcome = handler.handle(&event).await.unwrap();

        assert_eq!(outcome, HandleOutcome::Suppressed { reason: "not on a power of two: 5".into() });
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_team_is_skipped() {
        let notifier = RecordingNotifier::new();
        let handler = handler(HandlerBuilder::new("slack").build(), notifier.clone());

        let event = EventBuilder::new().client_name("web1").check_name("load").status(2).build();
        let outcome = handler.handle(&event).await.unwrap();

        assert!(matches!(outcome, HandleOutcome::Skipped { .. }));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_pagerduty_requires_page() {
        let notifier = RecordingNotifier::new();
        let config = HandlerBuilder::new("pd")
            .pagerduty()
            .team_json("ops", json!({"pagerduty_api_key": "routing-key"}))
            .build();
        let handler = handler(config, notifier.clone());

        let outcome = handler.handle(&ops_event().build()).await.unwrap();
        assert_eq!(outcome, HandleOutcome::Skipped { reason: "check does not page".into() });

        let outcome = handler.handle(&ops_event().page(true).build()).await.unwrap();
        assert!(matches!(outcome, HandleOutcome::Dispatched(_)));
        assert_eq!(notifier.channels(), vec!["routing-key"]);
    }

    #[tokio::test]
    async fn test_opsgenie_needs_page_and_recipients() {
        let notifier = RecordingNotifier::new();
        let config = HandlerBuilder::new("og")
            .opsgenie_at(None)
            .team_json("ops", json!({"opsgenie_api_key": "og-key"}))
            .team_json("db", json!({"opsgenie_api_key": "db-key", "opsgenie_recipients": "dba"}))
            .build();
        let handler = handler(config, notifier.clone());

        let outcome = handler.handle(&ops_event().build()).await.unwrap();
        assert_eq!(outcome, HandleOutcome::Skipped { reason: "check does not page".into() });

        let outcome = handler.handle(&ops_event().page(true).build()).await.unwrap();
        assert_eq!(
            outcome,
            HandleOutcome::Skipped { reason: "no opsgenie recipients for team ops".into() }
        );

        handler.handle(&ops_event().team("db").page(true).build()).await.unwrap();
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "db-key");
        assert_eq!(sent[0].1.recipients.as_deref(), Some("dba"));
    }

    #[tokio::test]
    async fn test_dispatch_to_resolved_channels() {
        let notifier = RecordingNotifier::new().strip_hash();
        let config = HandlerBuilder::new("irc")
            .nodebot("nodebot")
            .team_json("ops", json!({"irc_channels": ["#ops", "#ops-noise"]}))
            .build();
        let handler = handler(config, notifier.clone());

        let outcome = handler.handle(&ops_event().page(true).build()).await.unwrap();

        let HandleOutcome::Dispatched(report) = outcome else {
            panic!("expected dispatch, got {outcome:?}");
        };
        assert_eq!(report.delivered, vec!["ops-pages", "ops", "ops-noise"]);
        assert_eq!(notifier.channels(), vec!["ops-pages", "ops", "ops-noise"]);
    }

    #[tokio::test]
    async fn test_no_channels_is_skipped() {
        let notifier = RecordingNotifier::new();
        let config = HandlerBuilder::new("slack").build();
        let handler = handler(config, notifier.clone());

        let outcome = handler.handle(&ops_event().build()).await.unwrap();
        assert_eq!(outcome, HandleOutcome::Skipped { reason: "no channels for team ops".into() });
    }

    #[tokio::test]
    async fn test_compact_flag_comes_from_team() {
        let notifier = RecordingNotifier::new();
        let config = HandlerBuilder::new("slack")
            .slack("https://hooks.slack.com/services/T/B/X")
            .team_json("ops", json!({"slack_channels": "#ops", "slack_compact_message": true}))
            .build();
        let handler = handler(config, notifier.clone());

        handler.handle(&ops_event().build()).await.unwrap();
        assert!(notifier.sent()[0].1.compact);
    }

    #[tokio::test]
    async fn test_message_template_overrides_title_and_body() {
        let notifier = RecordingNotifier::new();
        let config = HandlerBuilder::new("hook")
            .team_json("ops", json!({"channel": "ops"}))
            .message("{{ check.name }} is {{ severity }}", "{{ summary }} ({{ occurrences }})")
            .build();
        let handler = handler(config, notifier.clone());

        handler.handle(&ops_event().output("full").build()).await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent[0].1.message.title, "disk_free is CRITICAL");
        assert_eq!(sent[0].1.message.body, "web1 : disk_free : full (1)");
    }

    #[test]
    fn test_template_context_offers_every_checked_key() {
        let event = ops_event().build();
        let notification = EventFormatter::default().notification(&event);

        let context = template_context(&event, &notification);
        let mut keys: Vec<&str> = context.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = crate::notification::template::MESSAGE_CONTEXT_KEYS.to_vec();
        keys.sort_unstable();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_broken_template_is_an_error() {
        let notifier = RecordingNotifier::new();
        let config = HandlerBuilder::new("hook")
            .team_json("ops", json!({"channel": "ops"}))
            .message("{{ nope.missing }}", "body")
            .build();
        let handler = handler(config, notifier.clone());

        let result = handler.handle(&ops_event().build()).await;
        assert!(matches!(result, Err(HandlerError::Template(_))));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_handle_payload_rejects_garbage() {
        let handler = handler(HandlerBuilder::new("out").build(), RecordingNotifier::new());
        assert!(matches!(
            handler.handle_payload("not json").await,
            Err(HandlerError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_outcome_display() {
        let report = DeliveryReport {
            delivered: vec!["#ops".into()],
            skipped: vec![("pd-key".into(), "pagerduty sends nothing for a UNKNOWN create event".into())],
            failed: vec![("#dev".into(), "timed out".into())],
        };
        assert_eq!(
            HandleOutcome::Dispatched(report).to_string(),
            "delivered to [#ops]; skipped pd-key: pagerduty sends nothing for a UNKNOWN create event; \
             failed #dev: timed out"
        );
    }
}
