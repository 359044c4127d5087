//! Chat message model.

use std::fmt;

use super::value_object::{ConnectionId, DisplayName, MessageText};

/// Kind of a relayed message, carried as the `type` field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A chat line; always carries text.
    Message,
    /// A typing indicator; never carries text.
    Typing,
}

impl MessageKind {
    /// Wire tag of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Typing => "typing",
        }
    }

    /// Parse a wire tag. Returns `None` for unknown tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "message" => Some(Self::Message),
            "typing" => Some(Self::Typing),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable decoded message.
///
/// `text` is `Some` exactly when `kind` is [`MessageKind::Message`]; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    kind: MessageKind,
    user: DisplayName,
    text: Option<MessageText>,
}

impl ChatMessage {
    /// A chat line from `user`.
    pub fn message(user: DisplayName, text: MessageText) -> Self {
        Self {
            kind: MessageKind::Message,
            user,
            text: Some(text),
        }
    }

    /// A typing indicator from `user`.
    pub fn typing(user: DisplayName) -> Self {
        Self {
            kind: MessageKind::Typing,
            user,
            text: None,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn user(&self) -> &DisplayName {
        &self.user
    }

    pub fn text(&self) -> Option<&MessageText> {
        self.text.as_ref()
    }
}

/// A message tagged with the connection it came from.
///
/// The origin is internal routing data and never goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub origin: ConnectionId,
    pub message: ChatMessage,
}

impl Envelope {
    pub fn new(origin: ConnectionId, message: ChatMessage) -> Self {
        Self { origin, message }
    }
}
