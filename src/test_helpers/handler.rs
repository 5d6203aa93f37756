use url::Url;

use crate::{
    config::HttpRetryConfig,
    models::{
        handler::{
            HandlerConfig, HipChatConfig, NodebotConfig, OpsGenieConfig, PagerDutyConfig,
            SlackConfig, StdoutConfig, TransportConfig, WebhookConfig,
        },
        notification::NotificationMessage,
        team::{TeamConfig, TeamDirectory},
    },
};

/// A builder for creating `HandlerConfig` instances for testing.
pub struct HandlerBuilder {
    name: String,
    transport: TransportConfig,
    teams: TeamDirectory,
    use_default_pager: Option<bool>,
    message: Option<NotificationMessage>,
}

impl HandlerBuilder {
    /// Creates a new `HandlerBuilder` for a stdout handler with no teams.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transport: TransportConfig::Stdout(StdoutConfig::default()),
            teams: TeamDirectory::default(),
            use_default_pager: None,
            message: None,
        }
    }

    /// Delivers to standard output.
    pub fn stdout(mut self) -> Self {
        self.transport = TransportConfig::Stdout(StdoutConfig::default());
        self
    }

    /// Delivers through a Slack webhook.
    pub fn slack(mut self, url: &str) -> Self {
        self.transport = TransportConfig::Slack(SlackConfig {
            webhook_url: Url::parse(url).unwrap(),
            retry_policy: HttpRetryConfig::default(),
        });
        self
    }

    /// Delivers to HipChat rooms through the public API.
    pub fn hipchat(self, api_key: &str) -> Self {
        self.hipchat_at(None, api_key)
    }

    /// Delivers to HipChat rooms through the API at `api_url`.
    pub fn hipchat_at(mut self, api_url: Option<&str>, api_key: &str) -> Self {
        self.transport = TransportConfig::Hipchat(HipChatConfig {
            api_url: api_url.map(|u| Url::parse(u).unwrap()),
            api_key: api_key.to_string(),
            sender: "sensu".to_string(),
            retry_policy: HttpRetryConfig::default(),
        });
        self
    }

    /// Relays to IRC by running `command`.
    pub fn nodebot(mut self, command: &str) -> Self {
        self.transport = TransportConfig::Nodebot(NodebotConfig { command: command.to_string() });
        self
    }

    /// Opens PagerDuty incidents through the public events API.
    pub fn pagerduty(self) -> Self {
        self.pagerduty_at(None)
    }

    /// Opens PagerDuty incidents through the events API at `events_url`.
    pub fn pagerduty_at(mut self, events_url: Option<&str>) -> Self {
        self.transport = TransportConfig::Pagerduty(PagerDutyConfig {
            events_url: events_url.map(|u| Url::parse(u).unwrap()),
            retry_policy: HttpRetryConfig::default(),
        });
        self
    }

    /// Opens OpsGenie alerts through the API at `api_url`, or the public one.
    pub fn opsgenie_at(mut self, api_url: Option<&str>) -> Self {
        self.transport = TransportConfig::Opsgenie(OpsGenieConfig {
            api_url: api_url.map(|u| Url::parse(u).unwrap()),
            retry_policy: HttpRetryConfig::default(),
        });
        self
    }

    /// Posts to a generic webhook.
    pub fn webhook(mut self, url: &str) -> Self {
        self.transport = TransportConfig::Webhook(WebhookConfig {
            url: Url::parse(url).unwrap(),
            method: None,
            secret: None,
            headers: None,
            retry_policy: HttpRetryConfig::default(),
        });
        self
    }

    /// Adds or replaces a team.
    pub fn team(mut self, name: &str, team: TeamConfig) -> Self {
        self.teams.insert(name, team);
        self
    }

    /// Adds a team from its YAML/JSON representation.
    pub fn team_json(self, name: &str, team: serde_json::Value) -> Self {
        let team: TeamConfig = serde_json::from_value(team).unwrap();
        self.team(name, team)
    }

    /// Sets the handler-wide default pager switch.
    pub fn use_default_pager(mut self, enabled: bool) -> Self {
        self.use_default_pager = Some(enabled);
        self
    }

    /// Sets a message template.
    pub fn message(mut self, title: &str, body: &str) -> Self {
        self.message =
            Some(NotificationMessage { title: title.to_string(), body: body.to_string() });
        self
    }

    /// Builds the `HandlerConfig` instance.
    pub fn build(self) -> HandlerConfig {
        HandlerConfig {
            name: self.name,
            transport: self.transport,
            teams: self.teams,
            use_default_pager: self.use_default_pager,
            message: self.message,
        }
    }
}
