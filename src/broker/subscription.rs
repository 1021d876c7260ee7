//! Subscriber-side end of a broker registration

use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;

use super::core::{Command, SubscriberId};

/// Receiving end of one subscriber's delivery queue.
///
/// The broker holds the only sender for the queue; this handle holds the only
/// receiver. Dropping the subscription deregisters it, so cleanup happens on
/// every exit path exactly once.
pub struct Subscription {
    pub(super) id: SubscriberId,
    pub(super) rx: mpsc::Receiver<Bytes>,
    pub(super) cmd_tx: mpsc::Sender<Command>,
}

impl Subscription {
    /// Identifier assigned by the broker
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next published payload.
    ///
    /// Returns `None` once the broker has dropped this subscriber's sender,
    /// i.e. after deregistration, eviction or broker shutdown. A pending
    /// `recv` is woken rather than left blocked forever.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Poll for the next payload; `Ready(None)` means the queue is closed
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Best effort: the broker also evicts subscribers whose queue has
        // been closed the next time it publishes.
        let _ = self.cmd_tx.try_send(Command::Deregister(self.id));
    }
}
