//! IRC delivery through the `nodebot` relay command.

use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;

use super::{Delivery, Notifier, description::truncate_chars, error::NotificationError};
use crate::models::notification::Notification;

/// Longest message line nodebot reliably relays once colour codes and
/// framing are added.
pub const IRC_LINE_MAX: usize = 415;

/// Relays notifications to IRC by running `<command> <channel> <message>`.
pub struct NodebotNotifier {
    command: String,
}

impl NodebotNotifier {
    /// Uses `command` as the nodebot executable.
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }

    /// Renders the single IRC line for `notification`.
    pub fn message(notification: &Notification) -> String {
        let severity = notification.severity;
        let pre = format!("[sensu] {} {} - ", severity.irc_color(), severity);
        let post = format!(" ({})", Local::now().format("%F %T"));
        let budget = IRC_LINE_MAX.saturating_sub(pre.chars().count() + post.chars().count());
        format!("{}{}{}", pre, truncate_chars(&notification.summary, budget), post)
    }
}

#[async_trait]
impl Notifier for NodebotNotifier {
    fn name(&self) -> &str {
        "nodebot"
    }

    /// Nodebot takes bare channel names.
    fn prepare_channels(&self, channels: Vec<String>) -> Vec<String> {
        let mut prepared: Vec<String> = Vec::with_capacity(channels.len());
        for channel in channels {
            let bare = channel.replace('#', "");
            if !bare.is_empty() && !prepared.contains(&bare) {
                prepared.push(bare);
            }
        }
        prepared
    }

    async fn notify(
        &self,
        channel: &str,
        notification: &Notification,
    ) -> Result<Delivery, NotificationError> {
        let message = Self::message(notification);
        tracing::debug!(command = %self.command, channel, "Relaying notification to IRC.");

        let output = Command::new(&self.command)
            .arg(channel)
            .arg(&message)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                NotificationError::ExecutionError(format!("failed to run '{}': {}", self.command, e))
            })?;

        if !output.status.success() {
            return Err(NotificationError::ExecutionError(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(Delivery::Sent)
    }
}
