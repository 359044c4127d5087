//! Broadcast hub: the single dispatch loop.
//!
//! Receive loops only enqueue into the [`Inbox`](crate::infrastructure::inbox::Inbox);
//! the hub is the only consumer and performs every fan-out write, one message
//! at a time, in enqueue order.

use tokio::task::JoinHandle;

use crate::{infrastructure::inbox::InboxReceiver, usecase::DispatchMessageUseCase};

pub struct Hub {
    inbox: InboxReceiver,
    dispatcher: DispatchMessageUseCase,
}

impl Hub {
    pub fn new(inbox: InboxReceiver, dispatcher: DispatchMessageUseCase) -> Self {
        Self { inbox, dispatcher }
    }

    /// Drain the inbox until every sender is gone.
    pub async fn run(mut self) {
        tracing::info!("hub started");
        let mut dispatched: u64 = 0;
        while let Some(envelope) = self.inbox.recv().await {
            self.dispatcher.execute(envelope).await;
            dispatched += 1;
        }
        tracing::info!(dispatched, "hub stopped");
    }

    /// Run the dispatch loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
