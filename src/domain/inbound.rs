//! Inbound items delivered by the chat transport.
//!
//! An item lives for exactly one trip through the orchestrator and is
//! never persisted itself.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A single inbound event
#[derive(Debug, Clone)]
pub struct InboundItem {
    /// Unique identifier for this event
    pub id: Uuid,

    /// Sender identity as reported by the transport
    pub sender: String,

    /// When the transport received the event
    pub received_at: DateTime<Utc>,

    /// What was sent
    pub payload: InboundPayload,
}

impl InboundItem {
    /// Create a new item stamped with the current time
    pub fn new(sender: impl Into<String>, payload: InboundPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            received_at: Utc::now(),
            payload,
        }
    }

    /// Convenience constructor for a chat text message
    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(sender, InboundPayload::TextCommand(text.into()))
    }

    /// Override the generated id (used when the transport supplies one)
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Short label of the payload kind, for logs
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Content of an inbound item
#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// Free chat text; may carry a `/a ` command or an embedded URL
    TextCommand(String),

    /// Voice clip
    Audio { bytes: Vec<u8>, mime: String },

    /// Picture
    Image {
        bytes: Vec<u8>,
        mime: String,
        file_name: String,
    },

    /// A bare URL handed over by the transport
    UrlReference(String),
}

impl InboundPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundPayload::TextCommand(_) => "text",
            InboundPayload::Audio { .. } => "audio",
            InboundPayload::Image { .. } => "image",
            InboundPayload::UrlReference(_) => "url",
        }
    }
}
