use async_trait::async_trait;

use super::{Delivery, Notifier, error::NotificationError};
use crate::models::notification::Notification;

/// A transport that prints notifications to standard output.
#[derive(Debug, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn notify(
        &self,
        channel: &str,
        notification: &Notification,
    ) -> Result<Delivery, NotificationError> {
        println!(
            "=== {} [{}] ===\n{}\n{}\n",
            channel, notification.severity, notification.message.title, notification.message.body
        );
        Ok(Delivery::Sent)
    }
}
