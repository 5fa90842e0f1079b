use crate::api::NotificationTransport;
use crate::error::DeliveryError;
use crate::model::SubscriberId;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Sends alert texts one at a time, pausing after every attempt.
///
/// A failed delivery only affects its own recipient; nothing here returns an
/// error to the caller.
pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
    send_delay: Duration,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        send_delay: Duration,
        send_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            send_delay,
            send_timeout,
        }
    }

    /// Returns whether the transport accepted the message.
    pub async fn send(&self, recipient: SubscriberId, text: &str) -> bool {
        let outcome =
            match tokio::time::timeout(self.send_timeout, self.transport.send_text(recipient, text))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(DeliveryError::Transport(format!(
                    "send timed out after {:?}",
                    self.send_timeout
                ))),
            };

        let (delivered, pause) = match outcome {
            Ok(()) => {
                debug!("Alert delivered to {}", recipient);
                (true, self.send_delay)
            }
            Err(DeliveryError::Blocked) => {
                debug!("Recipient {} blocked the bot, skipping", recipient);
                (false, self.send_delay)
            }
            Err(DeliveryError::RateLimited { retry_after_secs }) => {
                warn!(
                    "Delivery to {} rate limited, backing off {}s",
                    recipient, retry_after_secs
                );
                // capped by the send timeout
                let backoff = Duration::from_secs(retry_after_secs).min(self.send_timeout);
                (false, backoff.max(self.send_delay))
            }
            Err(e) => {
                warn!("Delivery to {} failed: {}", recipient, e);
                (false, self.send_delay)
            }
        };
        tokio::time::sleep(pause).await;
        delivered
    }
}
