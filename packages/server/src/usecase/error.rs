//! UseCase 層のエラー定義

use thiserror::Error;

/// Errors that end a receive loop.
///
/// Decode failures and a full inbox are not errors here: the frame is
/// dropped and the loop continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiveFrameError {
    /// The hub has stopped; nothing can be relayed any more.
    #[error("inbox is closed")]
    InboxClosed,
}
