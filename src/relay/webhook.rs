//! Webhook relay client and wire types.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

/// Fixed assistant text used when a webhook reply carries no usable message.
pub const REPLY_FALLBACK: &str = "Sorry, I couldn't process your request";

/// Wire format for one outbound chat turn.
///
/// The receiving workflow expects exactly this shape:
/// `{ "action": "sendMessage", "sessionId": ..., "chatInput": ... }`.
#[derive(Debug, Serialize)]
pub struct OutboundTurn<'a> {
    /// Always `"sendMessage"`.
    pub action: &'static str,
    /// Session the turn belongs to, so the workflow can keep context.
    #[serde(rename = "sessionId")]
    pub session_id: &'a str,
    /// The user's text.
    #[serde(rename = "chatInput")]
    pub chat_input: &'a str,
}

impl<'a> OutboundTurn<'a> {
    /// Build a `sendMessage` turn.
    #[must_use]
    pub fn send_message(session_id: &'a str, chat_input: &'a str) -> Self {
        Self {
            action: "sendMessage",
            session_id,
            chat_input,
        }
    }
}

/// Reply envelope returned by a webhook endpoint.
#[derive(Debug, Deserialize)]
pub struct WebhookReply {
    /// Canonical reply field. Deployments that omit it get the fallback text.
    #[serde(default)]
    pub message: Option<String>,
}

impl WebhookReply {
    /// Reply text, or [`REPLY_FALLBACK`] when the field is absent or empty.
    #[must_use]
    pub fn into_text(self) -> String {
        match self.message {
            Some(message) if !message.is_empty() => message,
            _ => REPLY_FALLBACK.to_string(),
        }
    }
}

/// Errors from delivering a chat turn to a webhook endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Network-level failure (connect, timeout, TLS).
    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The endpoint answered with a non-success status.
    #[error("webhook returned status {0}")]
    Status(StatusCode),
    /// The endpoint answered 2xx but the body was not a JSON reply envelope.
    #[error("webhook reply body was not valid JSON: {0}")]
    Body(#[source] reqwest::Error),
}

/// Client for per-tenant webhook endpoints.
///
/// Holds a shared [`reqwest::Client`]; the destination endpoint is explicit
/// per call since every tenant relays to its own URL.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    http: reqwest::Client,
}

impl WebhookRelay {
    /// Create a relay over an already-configured HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Deliver one chat turn and parse the reply envelope.
    pub async fn send_turn(
        &self,
        endpoint: &Url,
        session_id: &str,
        chat_input: &str,
    ) -> Result<WebhookReply, RelayError> {
        tracing::debug!(
            endpoint = %endpoint,
            session_id = %session_id,
            "Relaying chat turn"
        );

        let turn = OutboundTurn::send_message(session_id, chat_input);
        let resp = self
            .http
            .post(endpoint.clone())
            .json(&turn)
            .send()
            .await
            .map_err(RelayError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Status(status));
        }

        resp.json::<WebhookReply>().await.map_err(RelayError::Body)
    }
}
