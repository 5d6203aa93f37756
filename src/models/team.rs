//! Per-team notification settings.

use std::{borrow::Cow, collections::HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Notification settings of one team.
///
/// The handful of settings the handlers interpret are typed. Channel names
/// differ per transport and are kept untyped in `fields`, looked up through
/// [`TeamConfig::lookup`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TeamConfig {
    /// PagerDuty integration (routing) key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagerduty_api_key: Option<String>,

    /// OpsGenie customer API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opsgenie_api_key: Option<String>,

    /// Comma separated OpsGenie recipients (users, groups or teams).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opsgenie_recipients: Option<String>,

    /// Ticketing project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Address for email notifications. Read but not used for delivery.
    pub notification_email: Option<String>,

    /// Render Slack messages in their condensed form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_compact_message: Option<bool>,

    /// Fall back to `{team}-pages` when no pager channel is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_default_pager: Option<bool>,

    /// Channel names and any other team attribute.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TeamConfig {
    /// Looks up a team attribute by name, typed settings included.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        let typed = match key {
            "pagerduty_api_key" => self.pagerduty_api_key.clone().map(Value::String),
            "opsgenie_api_key" => self.opsgenie_api_key.clone().map(Value::String),
            "opsgenie_recipients" => self.opsgenie_recipients.clone().map(Value::String),
            "project" => self.project.clone().map(Value::String),
            "notification_email" => self.notification_email.clone().map(Value::String),
            "slack_compact_message" => self.slack_compact_message.map(Value::Bool),
            "use_default_pager" => self.use_default_pager.map(Value::Bool),
            _ => None,
        };
        typed.or_else(|| self.fields.get(key).cloned())
    }
}

/// All teams known to a handler, keyed by team name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TeamDirectory(HashMap<String, TeamConfig>);

impl TeamDirectory {
    /// Wraps a map of team name to settings.
    pub fn new(teams: HashMap<String, TeamConfig>) -> Self {
        Self(teams)
    }

    /// Settings of the named team, or an empty record when the team is not
    /// configured.
    pub fn team_data(&self, name: &str) -> Cow<'_, TeamConfig> {
        match self.0.get(name) {
            Some(team) => Cow::Borrowed(team),
            None => Cow::Owned(TeamConfig::default()),
        }
    }

    /// Whether the named team is configured.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of configured teams.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no team is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds or replaces a team.
    pub fn insert(&mut self, name: impl Into<String>, team: TeamConfig) {
        self.0.insert(name.into(), team);
    }
}
