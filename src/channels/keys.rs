//! Per-transport channel key aliases.

/// Supplies the attribute names a transport reads channels from.
///
/// Keys are tried in order, first on the check and then on the team.
pub trait ChannelKeySource: Send + Sync {
    /// Keys naming informational channels.
    fn channel_keys(&self) -> &'static [&'static str];

    /// Keys naming paging channels.
    fn pager_channel_keys(&self) -> &'static [&'static str];

    /// Paging channel used when nothing is configured, if the transport has
    /// one.
    fn default_pager_channel(&self, team: &str) -> Option<String> {
        Some(format!("{team}-pages"))
    }
}

/// Keys shared by generic chat-style transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseKeys;

impl ChannelKeySource for BaseKeys {
    fn channel_keys(&self) -> &'static [&'static str] {
        &["channel", "room"]
    }

    fn pager_channel_keys(&self) -> &'static [&'static str] {
        &["pager_channel", "pager_room"]
    }
}

/// Slack keys. Paging falls back to `#<team>-pages`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlackKeys;

impl ChannelKeySource for SlackKeys {
    fn channel_keys(&self) -> &'static [&'static str] {
        &["slack_channels", "notifications_slack_channel"]
    }

    fn pager_channel_keys(&self) -> &'static [&'static str] {
        &["pages_slack_channel"]
    }

    fn default_pager_channel(&self, team: &str) -> Option<String> {
        Some(format!("#{team}-pages"))
    }
}

/// HipChat prefers rooms over channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct HipChatKeys;

impl ChannelKeySource for HipChatKeys {
    fn channel_keys(&self) -> &'static [&'static str] {
        &["hipchat_room", "room", "channel"]
    }

    fn pager_channel_keys(&self) -> &'static [&'static str] {
        &["hipchat_pager_room", "pager_room", "pager_channel"]
    }
}

/// IRC keys, read by the nodebot transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrcKeys;

impl ChannelKeySource for IrcKeys {
    fn channel_keys(&self) -> &'static [&'static str] {
        &["irc_channels", "notifications_irc_channel"]
    }

    fn pager_channel_keys(&self) -> &'static [&'static str] {
        &["pages_irc_channel"]
    }

    fn default_pager_channel(&self, team: &str) -> Option<String> {
        Some(format!("#{team}-pages"))
    }
}

/// PagerDuty has no informational channels. Its single "pager channel" is
/// the team's integration key, and there is no sensible default for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagerDutyKeys;

impl ChannelKeySource for PagerDutyKeys {
    fn channel_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn pager_channel_keys(&self) -> &'static [&'static str] {
        &["pagerduty_api_key"]
    }

    fn default_pager_channel(&self, _team: &str) -> Option<String> {
        None
    }
}

/// OpsGenie routes on the team's API key, the same way PagerDuty does.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpsGenieKeys;

impl ChannelKeySource for OpsGenieKeys {
    fn channel_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn pager_channel_keys(&self) -> &'static [&'static str] {
        &["opsgenie_api_key"]
    }

    fn default_pager_channel(&self, _team: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pager_channels() {
        assert_eq!(BaseKeys.default_pager_channel("ops").as_deref(), Some("ops-pages"));
        assert_eq!(HipChatKeys.default_pager_channel("ops").as_deref(), Some("ops-pages"));
        assert_eq!(SlackKeys.default_pager_channel("ops").as_deref(), Some("#ops-pages"));
        assert_eq!(IrcKeys.default_pager_channel("ops").as_deref(), Some("#ops-pages"));
        assert_eq!(PagerDutyKeys.default_pager_channel("ops"), None);
        assert_eq!(OpsGenieKeys.default_pager_channel("ops"), None);
    }

    #[test]
    fn test_hipchat_prefers_room() {
        assert_eq!(HipChatKeys.channel_keys().first(), Some(&"hipchat_room"));
        assert_eq!(BaseKeys.channel_keys().first(), Some(&"channel"));
    }
}
