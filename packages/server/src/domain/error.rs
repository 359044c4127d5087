//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// DisplayName validation error
    #[error("DisplayName cannot be empty")]
    DisplayNameEmpty,

    /// DisplayName too long error
    #[error("DisplayName cannot exceed {max} characters (got {actual})")]
    DisplayNameTooLong { max: usize, actual: usize },

    /// MessageText too long error
    #[error("MessageText cannot exceed {max} characters (got {actual})")]
    MessageTextTooLong { max: usize, actual: usize },
}

/// Errors raised while decoding an inbound frame into a [`ChatMessage`].
///
/// None of these terminate the connection: the frame is dropped.
///
/// [`ChatMessage`]: super::ChatMessage
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("binary frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("invalid user: {0}")]
    InvalidUser(ValueObjectError),

    #[error("invalid text: {0}")]
    InvalidText(ValueObjectError),

    #[error("message of type 'message' requires a text field")]
    MissingText,
}

/// Errors raised when writing to a recipient connection.
///
/// The hub treats every variant as a disconnect and evicts the recipient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("write timed out after {0} ms")]
    Timeout(u64),

    #[error("connection is closed")]
    Closed,
}
