//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ロックはマップへのアクセスの間だけ保持し、接続への書き込みなどの I/O は
//! ロックの外（snapshot の呼び出し側）で行います。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, DisplayName, RegistryEntry, Timestamp,
};

struct Slot {
    connection: Arc<dyn Connection>,
    name: Option<DisplayName>,
    connected_at: Timestamp,
    /// Registration order, used to keep snapshots stable.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<ConnectionId, Slot>,
    next_seq: u64,
}

/// インメモリ Connection Registry 実装
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    inner: Mutex<Inner>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, connection: Arc<dyn Connection>) {
        let id = connection.id();
        let mut inner = self.inner.lock().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.slots.insert(
            id,
            Slot {
                connection,
                name: None,
                connected_at: Timestamp::now(),
                seq,
            },
        );
    }

    async fn set_name(&self, id: ConnectionId, name: DisplayName) {
        let mut inner = self.inner.lock().await;
        if let Some(slot) = inner.slots.get_mut(&id) {
            slot.name = Some(name);
        }
    }

    async fn unregister(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock().await;
        inner.slots.remove(&id).is_some()
    }

    async fn snapshot(&self) -> Vec<RegistryEntry> {
        let mut slots: Vec<(u64, RegistryEntry)> = {
            let inner = self.inner.lock().await;
            inner
                .slots
                .values()
                .map(|slot| {
                    (
                        slot.seq,
                        RegistryEntry {
                            connection: Arc::clone(&slot.connection),
                            name: slot.name.clone(),
                            connected_at: slot.connected_at,
                        },
                    )
                })
                .collect()
        };
        slots.sort_by_key(|(seq, _)| *seq);
        slots.into_iter().map(|(_, entry)| entry).collect()
    }

    async fn len(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.slots.len()
    }
}
