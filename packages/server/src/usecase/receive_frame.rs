//! UseCase: 受信フレーム処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReceiveFrameUseCase::execute() メソッド
//! - フレームのデコード、初回メッセージでの表示名設定、Inbox への投入
//!
//! ### なぜこのテストが必要か
//! - 不正な入力で接続が切れないこと（フレームを捨ててループを継続）を保証
//! - 表示名が最初のメッセージでのみ設定されることを確認
//! - Inbox が閉じた場合だけが受信ループの終了理由になることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージの投入と表示名の設定
//! - 異常系：不正 JSON、Inbox 満杯、Inbox 閉鎖
//! - エッジケース：2 通目以降で user が変わっても表示名は変わらない

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionRegistry, DecodeError, Envelope},
    infrastructure::{
        dto::websocket::{decode_binary, decode_text},
        inbox::{EnqueueError, Inbox},
    },
};

use super::error::ReceiveFrameError;

/// Per-connection state owned by the receive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    id: ConnectionId,
    named: bool,
}

impl ClientSession {
    pub fn new(id: ConnectionId) -> Self {
        Self { id, named: false }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the display name has been set from a first message.
    pub fn is_named(&self) -> bool {
        self.named
    }
}

/// An inbound data frame.
#[derive(Debug, Clone, Copy)]
pub enum InboundFrame<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

/// Why a frame was dropped without being relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Decode(DecodeError),
    InboxFull,
}

/// Result of handling one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Enqueued,
    Dropped(DropReason),
}

/// 受信フレーム処理のユースケース
pub struct ReceiveFrameUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    inbox: Inbox,
}

impl ReceiveFrameUseCase {
    /// 新しい ReceiveFrameUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, inbox: Inbox) -> Self {
        Self { registry, inbox }
    }

    /// 1 フレームを処理する
    ///
    /// # Returns
    ///
    /// * `Ok(FrameOutcome)` - 投入された、または破棄された（ループは継続）
    /// * `Err(ReceiveFrameError)` - Inbox が閉じている（ループを終了する）
    pub async fn execute(
        &self,
        session: &mut ClientSession,
        frame: InboundFrame<'_>,
    ) -> Result<FrameOutcome, ReceiveFrameError> {
        let decoded = match frame {
            InboundFrame::Text(text) => decode_text(text),
            InboundFrame::Binary(bytes) => decode_binary(bytes),
        };
        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(connection_id = %session.id, error = %e, "dropping undecodable frame");
                return Ok(FrameOutcome::Dropped(DropReason::Decode(e)));
            }
        };

        // The display name is taken from the first decoded message only.
        if !session.named {
            self.registry
                .set_name(session.id, message.user().clone())
                .await;
            session.named = true;
            tracing::info!(connection_id = %session.id, user = %message.user(), "client named");
        }

        tracing::debug!(
            connection_id = %session.id,
            user = %message.user(),
            kind = %message.kind(),
            "frame received"
        );

        match self.inbox.enqueue(Envelope::new(session.id, message)).await {
            Ok(()) => Ok(FrameOutcome::Enqueued),
            Err(EnqueueError::Full) => {
                tracing::warn!(connection_id = %session.id, "inbox full, dropping message");
                Ok(FrameOutcome::Dropped(DropReason::InboxFull))
            }
            Err(EnqueueError::Closed) => Err(ReceiveFrameError::InboxClosed),
        }
    }
}
