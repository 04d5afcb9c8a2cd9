//! Telegram transport — long-polls the Bot API for updates.
//!
//! Native Rust Telegram Bot API implementation over reqwest (no SDK
//! crate). Maps incoming messages to transport events and renders reply
//! keyboards to Bot API `reply_markup` objects.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::TransportError;
use crate::transport::{EventStream, Inbound, Outbound, ReplyOptions, Transport};

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram transport — connects to the Bot API via long-polling.
pub struct TelegramTransport {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot_token: SecretString, allowed_users: Vec<String>, poll_timeout_secs: u64) -> Self {
        Self {
            bot_token,
            allowed_users,
            poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    /// Check if an identity (username or numeric id) is in the allowed list.
    pub fn is_user_allowed(&self, identity: &str) -> bool {
        check_user_allowed(&self.allowed_users, &[identity.to_string()])
    }

    /// Send a single message chunk (≤4096 chars), optionally with a
    /// reply_markup object.
    async fn send_chunk(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&serde_json::Value>,
    ) -> Result<(), TransportError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = markup.clone();
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(TransportError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage returned {status}: {err}"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, TransportError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let allowed_users = self.allowed_users.clone();
        let poll_timeout_secs = self.poll_timeout_secs;
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram transport listening for updates...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": poll_timeout_secs,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: UpdatesResponse = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                for update in data.result {
                    // Advance offset past this update
                    offset = offset.max(update.update_id + 1);

                    let Some(message) = update.message else {
                        continue;
                    };

                    if !check_user_allowed(&allowed_users, &message.identities()) {
                        tracing::warn!(
                            chat_id = message.chat.id,
                            "Telegram: ignoring message from unauthorized user"
                        );
                        continue;
                    }

                    let Some(inbound) = message.into_inbound() else {
                        continue;
                    };

                    if tx.send(inbound).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send(&self, party_id: &str, message: Outbound) -> Result<(), TransportError> {
        let markup = reply_markup_json(&message.reply);
        let chunks = split_message(&message.text, TELEGRAM_MAX_MESSAGE_LENGTH);

        // Attach the keyboard to the last chunk so it lands with the
        // final piece of text.
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_markup = if i == last { markup.as_ref() } else { None };
            self.send_chunk(party_id, chunk, chunk_markup).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| TransportError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        tracing::info!("Telegram transport shutting down");
        Ok(())
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<User>,
    text: Option<String>,
    contact: Option<Contact>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contact {
    phone_number: String,
    #[serde(default)]
    first_name: String,
}

impl Message {
    /// Identities the allowlist is checked against: username and numeric id.
    fn identities(&self) -> Vec<String> {
        let mut identities = Vec::new();
        if let Some(ref from) = self.from {
            if let Some(ref username) = from.username {
                identities.push(username.clone());
            }
            identities.push(from.id.to_string());
        }
        identities
    }

    /// Map a Bot API message to a transport event. Messages with neither
    /// text nor a contact (stickers, photos, ...) are dropped.
    fn into_inbound(self) -> Option<Inbound> {
        let chat_id = self.chat.id.to_string();

        if let Some(contact) = self.contact {
            return Some(Inbound::contact(
                chat_id,
                contact.phone_number,
                contact.first_name,
            ));
        }

        let text = self.text?;
        if let Some(name) = command_name(&text) {
            let name = name.to_string();
            return Some(Inbound::command(chat_id, name));
        }
        Some(Inbound::text(chat_id, text))
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Check if any identity matches the allowed users list.
fn check_user_allowed(allowed_users: &[String], identities: &[String]) -> bool {
    allowed_users
        .iter()
        .any(|u| u == "*" || identities.iter().any(|id| id == u))
}

/// Extract the command name from a `/command` message, dropping any
/// `@botname` suffix and arguments.
fn command_name(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let name = rest.split_whitespace().next().unwrap_or("");
    let name = name.split('@').next().unwrap_or(name);
    (!name.is_empty()).then_some(name)
}

/// Render a reply instruction to the Bot API `reply_markup` object.
fn reply_markup_json(reply: &ReplyOptions) -> Option<serde_json::Value> {
    match reply {
        ReplyOptions::None => None,
        ReplyOptions::RemoveKeyboard => Some(serde_json::json!({ "remove_keyboard": true })),
        ReplyOptions::Keyboard(keyboard) => {
            let rows: Vec<Vec<serde_json::Value>> = keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| {
                            if button.request_contact {
                                serde_json::json!({
                                    "text": button.label,
                                    "request_contact": true
                                })
                            } else {
                                serde_json::json!({ "text": button.label })
                            }
                        })
                        .collect()
                })
                .collect();
            Some(serde_json::json!({
                "keyboard": rows,
                "one_time_keyboard": keyboard.one_time,
                "resize_keyboard": true
            }))
        }
    }
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let chunk = &remaining[..max_len];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(max_len);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { max_len } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
