//! # Message Delivery
//!
//! The [`Notifier`] trait is the seam between the pipeline and the outside
//! world. [`TelegramNotifier`] posts to the Bot API `sendMessage` method;
//! [`StdoutNotifier`] prints the message for development runs (`--stdout`).
//!
//! Delivery is best effort. Errors are returned to the caller, which logs
//! them and carries on.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram parse mode for the rendered text
const PARSE_MODE: &str = "Markdown";

/// Errors from a delivery attempt.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Request never got a response (URL stripped so the token stays out of logs)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram answered but did not accept the message
    #[error("Telegram rejected the message (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP status, when the channel has one
    pub status: Option<u16>,
    /// Free-form detail from the channel
    pub description: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn send(&self, text: &str) -> Result<Delivery, NotifyError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts messages to one Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    http: Client,
}

impl TelegramNotifier {
    pub fn new(http: Client, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            http,
        }
    }

    fn send_message_url(&self) -> String {
        format!("{TELEGRAM_API}/bot{}/sendMessage", self.token)
    }
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<Delivery, NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
        };

        let res = self
            .http
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        info!("Telegram status code: {}", status.as_u16());
        debug!("Telegram response: {}", body);

        interpret_response(status.as_u16(), &body)
    }
}

/// Decide whether a Telegram reply means the message was accepted.
fn interpret_response(status: u16, body: &str) -> Result<Delivery, NotifyError> {
    let parsed = serde_json::from_str::<TelegramResponse>(body).ok();
    let accepted = (200..300).contains(&status) && parsed.as_ref().is_some_and(|r| r.ok);

    if accepted {
        Ok(Delivery {
            status: Some(status),
            description: parsed.and_then(|r| r.description),
        })
    } else {
        Err(NotifyError::Rejected {
            status,
            description: parsed
                .and_then(|r| r.description)
                .unwrap_or_else(|| body.chars().take(200).collect()),
        })
    }
}

/// Prints messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str) -> Result<Delivery, NotifyError> {
        println!("{text}");
        Ok(Delivery {
            status: None,
            description: Some("printed to stdout".to_string()),
        })
    }
}
