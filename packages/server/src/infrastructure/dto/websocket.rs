//! WebSocket wire format for relayed messages.
//!
//! A message is a UTF-8 JSON object:
//!
//! ```json
//! {"type":"message","user":"alice","text":"hi"}
//! {"type":"typing","user":"alice"}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, DecodeError, DisplayName, MessageKind, MessageText};

/// JSON shape of a message, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            r#type: message.kind().as_str().to_string(),
            user: Some(message.user().as_str().to_string()),
            text: message.text().map(|text| text.as_str().to_string()),
        }
    }
}

impl TryFrom<WireMessage> for ChatMessage {
    type Error = DecodeError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let kind =
            MessageKind::parse(&wire.r#type).ok_or_else(|| DecodeError::UnknownType(wire.r#type))?;
        let user = DisplayName::new(wire.user.unwrap_or_default()).map_err(DecodeError::InvalidUser)?;

        match kind {
            MessageKind::Message => {
                let text = wire.text.ok_or(DecodeError::MissingText)?;
                let text = MessageText::new(text).map_err(DecodeError::InvalidText)?;
                Ok(ChatMessage::message(user, text))
            }
            // Text on a typing indicator carries no meaning and is dropped.
            MessageKind::Typing => Ok(ChatMessage::typing(user)),
        }
    }
}

/// Decode a text frame.
pub fn decode_text(frame: &str) -> Result<ChatMessage, DecodeError> {
    let wire: WireMessage =
        serde_json::from_str(frame).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    ChatMessage::try_from(wire)
}

/// Decode a binary frame holding UTF-8 JSON.
pub fn decode_binary(frame: &[u8]) -> Result<ChatMessage, DecodeError> {
    let text = std::str::from_utf8(frame).map_err(|_| DecodeError::InvalidUtf8)?;
    decode_text(text)
}

/// Encode a message to its wire representation.
pub fn encode(message: &ChatMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireMessage::from(message))
}
