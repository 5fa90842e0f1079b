use crate::api::NotificationTransport;
use crate::error::DeliveryError;
use crate::model::SubscriberId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: SubscriberId,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ReplyParameters>,
}

#[derive(Debug, Deserialize)]
struct ReplyParameters {
    retry_after: Option<u64>,
}

fn classify(status: StatusCode, reply: ApiReply) -> Result<(), DeliveryError> {
    if status.is_success() {
        return Ok(());
    }
    let description = reply.description.unwrap_or_default();
    match status {
        StatusCode::FORBIDDEN => Err(DeliveryError::Blocked),
        StatusCode::TOO_MANY_REQUESTS => Err(DeliveryError::RateLimited {
            retry_after_secs: reply
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(1),
        }),
        StatusCode::BAD_REQUEST => Err(DeliveryError::Malformed(description)),
        other => Err(DeliveryError::Transport(format!("{other}: {description}"))),
    }
}

/// Bot API `sendMessage` transport.
pub struct TelegramTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramTransport {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self::with_base_url(client, TELEGRAM_API_URL, token)
    }

    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    async fn send_text(&self, recipient: SubscriberId, text: &str) -> Result<(), DeliveryError> {
        // the token is part of the path
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let resp = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: recipient,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        let reply = resp.json::<ApiReply>().await.unwrap_or_default();
        classify(status, reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(json: &str) -> ApiReply {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_failure_classes() {
        assert_eq!(classify(StatusCode::OK, ApiReply::default()), Ok(()));
        assert_eq!(
            classify(
                StatusCode::FORBIDDEN,
                reply(r#"{"ok":false,"description":"Forbidden: bot was blocked by the user"}"#)
            ),
            Err(DeliveryError::Blocked)
        );
        assert_eq!(
            classify(
                StatusCode::TOO_MANY_REQUESTS,
                reply(r#"{"ok":false,"parameters":{"retry_after":7}}"#)
            ),
            Err(DeliveryError::RateLimited { retry_after_secs: 7 })
        );
        assert_eq!(
            classify(
                StatusCode::BAD_REQUEST,
                reply(r#"{"ok":false,"description":"Bad Request: can't parse entities"}"#)
            ),
            Err(DeliveryError::Malformed(
                "Bad Request: can't parse entities".to_string()
            ))
        );
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, ApiReply::default()),
            Err(DeliveryError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        // nothing listens on port 1
        let transport =
            TelegramTransport::with_base_url(Client::new(), "http://127.0.0.1:1", "123456:SECRET-TOKEN");
        match transport.send_text(42, "hello").await {
            Err(DeliveryError::Transport(msg)) => {
                assert!(!msg.contains("SECRET-TOKEN"), "token leaked: {msg}");
                assert!(!msg.contains("/bot"), "url leaked: {msg}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
