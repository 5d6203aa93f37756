//! Resolution of the channels an event is delivered to.
//!
//! Every transport reads the same precedence chain (check override, then
//! team setting, then a computed default for pages) and differs only in the
//! attribute names it reads, supplied by a [`ChannelKeySource`].

mod keys;

pub use keys::{
    BaseKeys, ChannelKeySource, HipChatKeys, IrcKeys, OpsGenieKeys, PagerDutyKeys, SlackKeys,
};
use serde_json::Value;

use crate::models::{
    event::Event,
    handler::{HandlerConfig, TransportConfig},
    team::TeamConfig,
};

/// Interprets a configured channel value.
///
/// A string is a single channel and an array a list of them. Absent, `false`,
/// empty strings and empty lists yield `None` so that the next source in the
/// precedence chain is consulted.
pub fn channel_values(value: &Value) -> Option<Vec<String>> {
    let channels: Vec<String> = match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => return None,
    };

    let channels: Vec<String> = channels.into_iter().filter(|c| !c.is_empty()).collect();
    if channels.is_empty() { None } else { Some(channels) }
}

/// Picks the key source matching a handler's transport.
pub fn key_source_for(transport: &TransportConfig) -> Box<dyn ChannelKeySource> {
    match transport {
        TransportConfig::Slack(_) => Box::new(SlackKeys),
        TransportConfig::Hipchat(_) => Box::new(HipChatKeys),
        TransportConfig::Nodebot(_) => Box::new(IrcKeys),
        TransportConfig::Pagerduty(_) => Box::new(PagerDutyKeys),
        TransportConfig::Opsgenie(_) => Box::new(OpsGenieKeys),
        TransportConfig::Webhook(_) | TransportConfig::Stdout(_) => Box::new(BaseKeys),
    }
}

/// Computes the ordered list of channels an event is delivered to.
pub struct ChannelResolver {
    keys: Box<dyn ChannelKeySource>,
    use_default_pager: bool,
}

impl ChannelResolver {
    /// Creates a resolver reading channels through `keys`.
    /// `use_default_pager` is the fallback when the team does not say.
    pub fn new(keys: Box<dyn ChannelKeySource>, use_default_pager: bool) -> Self {
        Self { keys, use_default_pager }
    }

    /// Creates the resolver for a configured handler.
    pub fn for_handler(handler: &HandlerConfig) -> Self {
        Self::new(key_source_for(&handler.transport), handler.use_default_pager.unwrap_or(true))
    }

    /// Paging channels first (only when the check pages), then
    /// informational channels. Repeats across the two lists are kept.
    pub fn resolve(&self, event: &Event, team: &TeamConfig) -> Vec<String> {
        let mut channels = Vec::new();
        if event.should_page() {
            channels.extend(self.pager_channels(event, team));
        }
        channels.extend(self.notification_channels(event, team));
        channels
    }

    /// Paging channels for the event, ignoring whether the check pages.
    pub fn pager_channels(&self, event: &Event, team: &TeamConfig) -> Vec<String> {
        if let Some(channels) = self.lookup(self.keys.pager_channel_keys(), event, team) {
            return channels;
        }

        let use_default = team.use_default_pager.unwrap_or(self.use_default_pager);
        match event.team_name() {
            Some(name) if use_default => self.keys.default_pager_channel(name).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Informational channels for the event.
    pub fn notification_channels(&self, event: &Event, team: &TeamConfig) -> Vec<String> {
        self.lookup(self.keys.channel_keys(), event, team).unwrap_or_default()
    }

    fn lookup(&self, keys: &[&str], event: &Event, team: &TeamConfig) -> Option<Vec<String>> {
        keys.iter()
            .find_map(|key| event.check.field(key).and_then(channel_values))
            .or_else(|| keys.iter().find_map(|key| team.lookup(key).as_ref().and_then(channel_values)))
    }
}
