//! UseCase: クライアント接続処理
//!
//! アップグレード済みの接続を Registry に登録し、受信ループ用のセッションを返します。

use std::sync::Arc;

use crate::domain::{Connection, ConnectionRegistry};

use super::receive_frame::ClientSession;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続を登録し、受信ループのセッションを返す
    ///
    /// 登録後は以降のブロードキャストの配信対象になる。
    pub async fn execute(&self, connection: Arc<dyn Connection>) -> ClientSession {
        let id = connection.id();
        self.registry.register(connection).await;
        let connected = self.registry.len().await;
        tracing::info!(connection_id = %id, connected, "client connected");
        ClientSession::new(id)
    }
}
