//! UseCase: メッセージ配信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchMessageUseCase::execute() メソッド
//! - 配信先の選定、書き込み、失敗した配信先の退去（eviction）
//!
//! ### なぜこのテストが必要か
//! - 送信者には配信されず、他の全員に配信されることを保証
//! - 1 件の配信失敗が他の配信先への配信を止めないことを確認
//! - 応答しない配信先がタイムアウトで退去されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者以外への配信
//! - 異常系：書き込み失敗、書き込みタイムアウト
//! - エッジケース：配信先がいない場合

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{
        ConnectionId, ConnectionRegistry, DeliveryError, Envelope, RegistryEntry, RoutingPolicy,
    },
    infrastructure::dto::websocket::encode,
};

/// Outcome of dispatching one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Recipients the message was written to, in snapshot order.
    pub delivered: Vec<ConnectionId>,
    /// Recipients whose write failed and who were evicted.
    pub evicted: Vec<ConnectionId>,
}

/// メッセージ配信のユースケース
pub struct DispatchMessageUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    routing: RoutingPolicy,
    write_timeout: Duration,
}

impl DispatchMessageUseCase {
    /// 新しい DispatchMessageUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        routing: RoutingPolicy,
        write_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            routing,
            write_timeout,
        }
    }

    /// 1 通のメッセージを配信する
    ///
    /// Registry のスナップショットを取り、ロックを保持せずに各配信先へ書き込む。
    /// 書き込みに失敗した、またはタイムアウトした配信先はその場で退去させ、
    /// 残りの配信先への配信を続ける。
    pub async fn execute(&self, envelope: Envelope) -> DispatchReport {
        let mut report = DispatchReport::default();

        let snapshot = self.registry.snapshot().await;
        let recipients = self.routing.recipients(snapshot, &envelope);
        if recipients.is_empty() {
            tracing::debug!(origin = %envelope.origin, "no recipients");
            return report;
        }

        let payload = match encode(&envelope.message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(origin = %envelope.origin, error = %e, "failed to encode message");
                return report;
            }
        };

        for entry in recipients {
            let id = entry.id();
            match self.deliver(&entry, payload.clone()).await {
                Ok(()) => report.delivered.push(id),
                Err(e) => {
                    tracing::warn!(
                        connection_id = %id,
                        user = entry.name.as_ref().map(|n| n.as_str()).unwrap_or("-"),
                        error = %e,
                        "delivery failed, evicting recipient"
                    );
                    self.evict(&entry).await;
                    report.evicted.push(id);
                }
            }
        }

        tracing::debug!(
            origin = %envelope.origin,
            user = %envelope.message.user(),
            delivered = report.delivered.len(),
            evicted = report.evicted.len(),
            "message dispatched"
        );
        report
    }

    async fn deliver(&self, entry: &RegistryEntry, payload: String) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.write_timeout, entry.connection.send_text(payload)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.write_timeout.as_millis() as u64)),
        }
    }

    /// Remove the recipient first so no concurrent snapshot picks it up, then
    /// release its stream.
    async fn evict(&self, entry: &RegistryEntry) {
        self.registry.unregister(entry.id()).await;
        entry.connection.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatMessage, Connection, DisplayName, MessageText, MockConnection},
        infrastructure::registry::InMemoryConnectionRegistry,
        testing::{FakeConnection, WriteBehavior},
    };

    const PAYLOAD: &str = r#"{"type":"message","user":"alice","text":"hi"}"#;

    fn alice_says(origin: ConnectionId, text: &str) -> Envelope {
        Envelope::new(
            origin,
            ChatMessage::message(
                DisplayName::new("alice".to_string()).unwrap(),
                MessageText::new(text.to_string()).unwrap(),
            ),
        )
    }

    fn usecase(registry: Arc<InMemoryConnectionRegistry>) -> DispatchMessageUseCase {
        DispatchMessageUseCase::new(
            registry,
            RoutingPolicy::ExcludeSender,
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_dispatch_to_everyone_but_sender() {
        // テスト項目: 送信者以外の全員に同じ JSON が配信され、送信者には配信されない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let alice = FakeConnection::accepting();
        let bob = FakeConnection::accepting();
        let carol = FakeConnection::accepting();
        for connection in [&alice, &bob, &carol] {
            registry.register(connection.clone()).await;
        }

        // when (操作):
        let report = usecase(registry.clone())
            .execute(alice_says(alice.id(), "hi"))
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, vec![bob.id(), carol.id()]);
        assert!(report.evicted.is_empty());
        assert!(alice.sent().await.is_empty());
        assert_eq!(bob.sent().await, vec![PAYLOAD.to_string()]);
        assert_eq!(carol.sent().await, vec![PAYLOAD.to_string()]);
    }

    #[tokio::test]
    async fn test_failed_write_evicts_only_that_recipient() {
        // テスト項目: 書き込みに失敗した配信先だけが退去され、他の配信は継続される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let alice = FakeConnection::accepting();
        let dead = FakeConnection::new(WriteBehavior::Fail);
        let carol = FakeConnection::accepting();
        for connection in [&alice, &dead, &carol] {
            registry.register(connection.clone()).await;
        }
        let usecase = usecase(registry.clone());

        // when (操作):
        let first = usecase.execute(alice_says(alice.id(), "one")).await;
        let second = usecase.execute(alice_says(alice.id(), "two")).await;

        // then (期待する結果):
        assert_eq!(first.evicted, vec![dead.id()]);
        assert_eq!(first.delivered, vec![carol.id()]);
        assert!(dead.is_closed());
        assert_eq!(registry.len().await, 2);
        // 退去済みの接続には以降のメッセージは届かない
        assert_eq!(second.delivered, vec![carol.id()]);
        assert!(second.evicted.is_empty());
        assert_eq!(carol.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_hanging_write_times_out_and_evicts() {
        // テスト項目: 応答しない配信先は書き込みタイムアウトで退去される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let alice = FakeConnection::accepting();
        let stuck = FakeConnection::new(WriteBehavior::Hang);
        let carol = FakeConnection::accepting();
        for connection in [&alice, &stuck, &carol] {
            registry.register(connection.clone()).await;
        }

        // when (操作):
        let report = usecase(registry.clone())
            .execute(alice_says(alice.id(), "hi"))
            .await;

        // then (期待する結果):
        assert_eq!(report.evicted, vec![stuck.id()]);
        assert_eq!(report.delivered, vec![carol.id()]);
        assert!(stuck.is_closed());
        assert_eq!(carol.sent().await, vec![PAYLOAD.to_string()]);
    }

    #[tokio::test]
    async fn test_eviction_closes_stream_once_via_mock() {
        // テスト項目: 配信失敗時に close が 1 回だけ呼ばれ、Registry から削除される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let sender = FakeConnection::accepting();
        let broken_id = ConnectionId::generate();
        let mut broken = MockConnection::new();
        broken.expect_id().return_const(broken_id);
        broken
            .expect_send_text()
            .times(1)
            .returning(|_| Err(DeliveryError::Transport("broken pipe".to_string())));
        broken.expect_close().times(1).returning(|| ());
        registry.register(sender.clone()).await;
        registry.register(Arc::new(broken)).await;

        // when (操作):
        let report = usecase(registry.clone())
            .execute(alice_says(sender.id(), "hi"))
            .await;

        // then (期待する結果):
        assert_eq!(report.evicted, vec![broken_id]);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_recipients() {
        // テスト項目: 送信者しか接続していない場合は何も配信されない
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let alice = FakeConnection::accepting();
        registry.register(alice.clone()).await;

        let report = usecase(registry.clone())
            .execute(alice_says(alice.id(), "hi"))
            .await;

        assert_eq!(report, DispatchReport::default());
        assert!(alice.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_name_based_routing_excludes_namesakes() {
        // テスト項目: 名前ベースのルーティングでは同名の接続にも配信されない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let alice = FakeConnection::accepting();
        let alice_twin = FakeConnection::accepting();
        let bob = FakeConnection::accepting();
        for connection in [&alice, &alice_twin, &bob] {
            registry.register(connection.clone()).await;
        }
        let alice_name = DisplayName::new("alice".to_string()).unwrap();
        registry.set_name(alice.id(), alice_name.clone()).await;
        registry.set_name(alice_twin.id(), alice_name).await;
        let usecase = DispatchMessageUseCase::new(
            registry.clone(),
            RoutingPolicy::ExcludeSenderName,
            Duration::from_millis(100),
        );

        // when (操作):
        let report = usecase.execute(alice_says(alice.id(), "hi")).await;

        // then (期待する結果):
        assert_eq!(report.delivered, vec![bob.id()]);
        assert!(alice_twin.sent().await.is_empty());
    }
}
