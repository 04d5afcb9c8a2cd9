//! Transport abstraction for message I/O.
//!
//! The conversation core only speaks `Inbound`/`Outbound`; everything
//! wire-specific (long-polling, keyboard rendering) lives behind the
//! `Transport` trait.

pub mod cli;
pub mod telegram;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::TransportError;

pub use cli::CliTransport;
pub use telegram::TelegramTransport;

/// An inbound event from a conversing party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Opaque party identifier (the chat id, for Telegram).
    pub party_id: String,
    /// What the party sent.
    pub payload: Payload,
}

impl Inbound {
    pub fn command(party_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            party_id: party_id.into(),
            payload: Payload::Command(name.into()),
        }
    }

    pub fn text(party_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            party_id: party_id.into(),
            payload: Payload::Text(text.into()),
        }
    }

    pub fn contact(
        party_id: impl Into<String>,
        phone_number: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        Self {
            party_id: party_id.into(),
            payload: Payload::Contact(ContactPayload {
                phone_number: phone_number.into(),
                first_name: first_name.into(),
            }),
        }
    }
}

/// The content of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A slash command, without the leading `/`.
    Command(String),
    /// Free text.
    Text(String),
    /// A shared contact.
    Contact(ContactPayload),
}

/// A contact the party shared through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPayload {
    pub phone_number: String,
    pub first_name: String,
}

/// An outbound message, optionally carrying a reply-keyboard instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub reply: ReplyOptions,
}

impl Outbound {
    /// Plain text, no keyboard change.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply: ReplyOptions::None,
        }
    }

    /// Text with a reply keyboard attached.
    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            reply: ReplyOptions::Keyboard(keyboard),
        }
    }

    /// Text that also removes any visible reply keyboard.
    pub fn removing_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply: ReplyOptions::RemoveKeyboard,
        }
    }
}

/// Reply-keyboard instruction attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOptions {
    None,
    Keyboard(Keyboard),
    RemoveKeyboard,
}

/// An ordered grid of reply buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
    /// Hide the keyboard after one use.
    pub one_time: bool,
}

/// A single reply button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Pressing the button asks the party to share their contact.
    pub request_contact: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_contact: false,
        }
    }

    pub fn contact_request(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_contact: true,
        }
    }
}

/// Stream of inbound events produced by a transport.
pub type EventStream = Pin<Box<dyn Stream<Item = Inbound> + Send>>;

/// A messaging transport the controller receives from and replies through.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &str;

    /// Start listening and return the inbound event stream.
    async fn start(&self) -> Result<EventStream, TransportError>;

    /// Deliver a message to a party.
    async fn send(&self, party_id: &str, message: Outbound) -> Result<(), TransportError>;

    /// Verify the transport is reachable.
    async fn health_check(&self) -> Result<(), TransportError>;

    /// Graceful shutdown.
    async fn shutdown(&self) -> Result<(), TransportError>;
}
