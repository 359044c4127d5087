//! UseCase: クライアント切断処理
//!
//! 受信ループの終了時に、終了理由に関わらず必ず呼び出されます。
//! 配信失敗による退去（eviction）と競合しても安全なように冪等です。

use std::sync::Arc;

use crate::domain::{Connection, ConnectionRegistry};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Registry から削除し、ストリームを解放する
    ///
    /// # Returns
    ///
    /// この呼び出しで Registry から削除された場合は `true`
    /// （すでに退去済みなら `false`）
    pub async fn execute(&self, connection: &dyn Connection) -> bool {
        let id = connection.id();
        let removed = self.registry.unregister(id).await;
        connection.close().await;
        let connected = self.registry.len().await;
        tracing::info!(connection_id = %id, removed, connected, "client disconnected");
        removed
    }
}
