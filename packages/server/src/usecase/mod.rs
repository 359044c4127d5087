//! UseCase 層
//!
//! リレーの処理を実装するレイヤー。
//! UI 層（受信ループ）と Hub（配信ループ）から呼び出され、Domain 層を操作します。

pub mod connect_client;
pub mod disconnect_client;
pub mod dispatch_message;
pub mod error;
pub mod receive_frame;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use dispatch_message::{DispatchMessageUseCase, DispatchReport};
pub use error::ReceiveFrameError;
pub use receive_frame::{ClientSession, DropReason, FrameOutcome, InboundFrame, ReceiveFrameUseCase};
