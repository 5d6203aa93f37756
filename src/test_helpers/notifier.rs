use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    models::notification::Notification,
    notification::{Delivery, Notifier, error::NotificationError},
};

/// A notifier that records every delivery instead of sending it.
///
/// Clones share the same record, so a test can keep one handle and give the
/// other to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, Notification)>>>,
    failing: Arc<HashSet<String>>,
    strip_hash: bool,
}

impl RecordingNotifier {
    /// Creates a notifier that accepts every channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deliveries to the given channels fail.
    pub fn failing_on(mut self, channels: &[&str]) -> Self {
        self.failing = Arc::new(channels.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Strips `#` from channel names the way the IRC transport does.
    pub fn strip_hash(mut self) -> Self {
        self.strip_hash = true;
        self
    }

    /// Every successful delivery so far, in order.
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    /// Channels delivered to so far, in order.
    pub fn channels(&self) -> Vec<String> {
        self.sent().into_iter().map(|(channel, _)| channel).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn prepare_channels(&self, channels: Vec<String>) -> Vec<String> {
        if self.strip_hash {
            channels.into_iter().map(|c| c.replace('#', "")).collect()
        } else {
            channels
        }
    }

    async fn notify(
        &self,
        channel: &str,
        notification: &Notification,
    ) -> Result<Delivery, NotificationError> {
        if self.failing.contains(channel) {
            return Err(NotificationError::NotifyFailed(format!("{channel} rejected the message")));
        }
        self.sent.lock().unwrap().push((channel.to_string(), notification.clone()));
        Ok(Delivery::Sent)
    }
}
