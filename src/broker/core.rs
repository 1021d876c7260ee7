//! Broker event loop and external handle

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::config::{BrokerConfig, SlowSubscriberPolicy};
use super::error::BrokerError;
use super::subscription::Subscription;

/// Identifier for one registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Commands drained, one at a time, by the broker loop
pub(super) enum Command {
    Register(SubscriberId, mpsc::Sender<Bytes>),
    Deregister(SubscriberId),
    Publish(Bytes),
    SubscriberCount(oneshot::Sender<usize>),
}

/// The broadcast core.
///
/// Owns the subscriber registry. Every registry access happens inside
/// [`Broker::run`], so the order commands are drained from the channel is the
/// order their effects become visible: a payload reaches exactly the
/// subscribers registered when its publish command is processed.
pub struct Broker {
    cmd_rx: mpsc::Receiver<Command>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<Bytes>>,
    config: BrokerConfig,
}

impl Broker {
    /// Create a broker and the handle used to talk to it
    pub fn new(config: BrokerConfig) -> (Self, BrokerHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity.max(1));

        let handle = BrokerHandle {
            cmd_tx,
            next_id: Arc::new(AtomicU64::new(1)),
            subscriber_capacity: config.subscriber_capacity.max(1),
        };

        let broker = Self {
            cmd_rx,
            subscribers: HashMap::new(),
            config,
        };

        (broker, handle)
    }

    /// Create a broker and spawn its event loop onto the runtime
    pub fn spawn(config: BrokerConfig) -> (JoinHandle<()>, BrokerHandle) {
        let (broker, handle) = Self::new(config);
        (tokio::spawn(broker.run()), handle)
    }

    /// Run the event loop until every handle has been dropped
    pub async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                Command::Register(id, tx) => {
                    self.subscribers.insert(id, tx);
                    tracing::info!(
                        subscriber = %id,
                        registered = self.subscribers.len(),
                        "Subscriber registered"
                    );
                }
                Command::Deregister(id) => {
                    // Idempotent: removing an unknown subscriber is a no-op
                    if self.subscribers.remove(&id).is_some() {
                        tracing::info!(
                            subscriber = %id,
                            registered = self.subscribers.len(),
                            "Subscriber removed"
                        );
                    }
                }
                Command::Publish(payload) => self.fan_out(payload).await,
                Command::SubscriberCount(reply) => {
                    let _ = reply.send(self.subscribers.len());
                }
            }
        }

        tracing::debug!("Broker loop stopped: all handles dropped");
    }

    /// Deliver one payload to every currently registered subscriber
    async fn fan_out(&mut self, payload: Bytes) {
        use tokio::sync::mpsc::error::TrySendError;

        let mut evict: Vec<SubscriberId> = Vec::new();

        for (id, tx) in &self.subscribers {
            match self.config.slow_subscriber_policy {
                SlowSubscriberPolicy::Wait => {
                    if tx.send(payload.clone()).await.is_err() {
                        evict.push(*id);
                    }
                }
                SlowSubscriberPolicy::Drop => match tx.try_send(payload.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(subscriber = %id, "Delivery queue full, payload dropped");
                    }
                    Err(TrySendError::Closed(_)) => evict.push(*id),
                },
                SlowSubscriberPolicy::Disconnect => match tx.try_send(payload.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(subscriber = %id, "Delivery queue full, evicting subscriber");
                        evict.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => evict.push(*id),
                },
            }
        }

        for id in evict {
            self.subscribers.remove(&id);
            tracing::info!(
                subscriber = %id,
                registered = self.subscribers.len(),
                "Subscriber removed"
            );
        }
    }
}

/// Cloneable message-passing API of the broker.
///
/// This is the only way to touch the registry; the loop processes commands
/// from all handles in the order it observes them.
#[derive(Clone)]
pub struct BrokerHandle {
    cmd_tx: mpsc::Sender<Command>,
    next_id: Arc<AtomicU64>,
    subscriber_capacity: usize,
}

impl BrokerHandle {
    /// Register a new subscriber and return the receiving end of its queue.
    ///
    /// The registration is visible to every publish submitted after this call
    /// returns on the same handle.
    pub async fn subscribe(&self) -> Result<Subscription, BrokerError> {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.subscriber_capacity);

        self.cmd_tx
            .send(Command::Register(id, tx))
            .await
            .map_err(|_| BrokerError::Shutdown)?;

        Ok(Subscription {
            id,
            rx,
            cmd_tx: self.cmd_tx.clone(),
        })
    }

    /// Remove a subscriber from the registry; a no-op if it is not present
    pub async fn deregister(&self, id: SubscriberId) -> Result<(), BrokerError> {
        self.cmd_tx
            .send(Command::Deregister(id))
            .await
            .map_err(|_| BrokerError::Shutdown)
    }

    /// Publish one payload to every subscriber registered when the loop
    /// processes this command
    pub async fn publish(&self, payload: Bytes) -> Result<(), BrokerError> {
        self.cmd_tx
            .send(Command::Publish(payload))
            .await
            .map_err(|_| BrokerError::Shutdown)
    }

    /// Number of currently registered subscribers.
    ///
    /// Answered by the loop itself, so the reply reflects every command
    /// submitted on this handle before the call.
    pub async fn subscriber_count(&self) -> Result<usize, BrokerError> {
        let (tx, rx) = oneshot::channel();

        self.cmd_tx
            .send(Command::SubscriberCount(tx))
            .await
            .map_err(|_| BrokerError::Shutdown)?;

        rx.await.map_err(|_| BrokerError::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const RECV_DEADLINE: Duration = Duration::from_secs(1);

    async fn recv_within(sub: &mut Subscription) -> Option<Bytes> {
        timeout(RECV_DEADLINE, sub.recv())
            .await
            .expect("receive timed out")
    }

    #[tokio::test]
    async fn test_fan_out_exactly_once() {
        let (_task, broker) = Broker::spawn(BrokerConfig::default());

        let mut subs = Vec::new();
        for _ in 0..5 {
            subs.push(broker.subscribe().await.unwrap());
        }

        broker.publish(Bytes::from_static(b"ping")).await.unwrap();

        for sub in &mut subs {
            assert_eq!(recv_within(sub).await, Some(Bytes::from_static(b"ping")));
        }

        // No duplicates: queues are empty again once all handles settle
        broker.publish(Bytes::from_static(b"pong")).await.unwrap();
        for sub in &mut subs {
            assert_eq!(recv_within(sub).await, Some(Bytes::from_static(b"pong")));
        }
    }

    #[tokio::test]
    async fn test_membership_scenario() {
        let (_task, broker) = Broker::spawn(BrokerConfig::default());

        let mut a = broker.subscribe().await.unwrap();
        let mut b = broker.subscribe().await.unwrap();

        broker.publish(Bytes::from_static(b"ping")).await.unwrap();
        assert_eq!(recv_within(&mut a).await, Some(Bytes::from_static(b"ping")));
        assert_eq!(recv_within(&mut b).await, Some(Bytes::from_static(b"ping")));

        broker.deregister(a.id()).await.unwrap();
        broker.publish(Bytes::from_static(b"pong")).await.unwrap();

        assert_eq!(recv_within(&mut b).await, Some(Bytes::from_static(b"pong")));
        // A's sender was dropped on deregistration: its pending receive is
        // woken with end-of-stream instead of "pong"
        assert_eq!(recv_within(&mut a).await, None);
    }

    #[tokio::test]
    async fn test_registration_visible_to_later_publishes_only() {
        let (_task, broker) = Broker::spawn(BrokerConfig::default());

        broker.publish(Bytes::from_static(b"early")).await.unwrap();

        let mut late = broker.subscribe().await.unwrap();
        broker.publish(Bytes::from_static(b"late")).await.unwrap();

        // The subscriber only sees payloads published after its registration
        assert_eq!(
            recv_within(&mut late).await,
            Some(Bytes::from_static(b"late"))
        );
    }

    #[tokio::test]
    async fn test_idempotent_deregistration() {
        let (_task, broker) = Broker::spawn(BrokerConfig::default());

        let a = broker.subscribe().await.unwrap();
        let id = a.id();

        broker.deregister(id).await.unwrap();
        broker.deregister(id).await.unwrap();
        assert_eq!(broker.subscriber_count().await.unwrap(), 0);

        // The loop is still healthy afterwards
        let mut b = broker.subscribe().await.unwrap();
        broker.publish(Bytes::from_static(b"ok")).await.unwrap();
        assert_eq!(recv_within(&mut b).await, Some(Bytes::from_static(b"ok")));
    }

    #[tokio::test]
    async fn test_drop_guard_deregisters() {
        let (_task, broker) = Broker::spawn(BrokerConfig::default());

        let a = broker.subscribe().await.unwrap();
        assert_eq!(broker.subscriber_count().await.unwrap(), 1);

        drop(a);

        // The guard's deregister command lands before the count query
        assert_eq!(broker.subscriber_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_drop_policy() {
        let config = BrokerConfig::default()
            .subscriber_capacity(1)
            .slow_subscriber_policy(SlowSubscriberPolicy::Drop);
        let (_task, broker) = Broker::spawn(config);

        let mut stalled = broker.subscribe().await.unwrap();
        let mut healthy = broker.subscribe().await.unwrap();

        // The first publish fills both single-slot queues; the healthy
        // subscriber drains its copy, the stalled one never reads
        broker.publish(Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(
            recv_within(&mut healthy).await,
            Some(Bytes::from_static(b"x"))
        );

        // At the second publish only the stalled queue is full, so the
        // payload is dropped for it alone and the healthy subscriber still
        // receives it within bounded time
        broker.publish(Bytes::from_static(b"y")).await.unwrap();
        assert_eq!(
            recv_within(&mut healthy).await,
            Some(Bytes::from_static(b"y"))
        );

        // The stalled one kept the first payload, lost the second, and stays
        // registered for later payloads
        assert_eq!(
            recv_within(&mut stalled).await,
            Some(Bytes::from_static(b"x"))
        );
        broker.publish(Bytes::from_static(b"z")).await.unwrap();
        assert_eq!(
            recv_within(&mut stalled).await,
            Some(Bytes::from_static(b"z"))
        );
    }

    #[tokio::test]
    async fn test_slow_subscriber_disconnect_policy() {
        let config = BrokerConfig::default()
            .subscriber_capacity(1)
            .slow_subscriber_policy(SlowSubscriberPolicy::Disconnect);
        let (_task, broker) = Broker::spawn(config);

        let mut stalled = broker.subscribe().await.unwrap();
        let mut healthy = broker.subscribe().await.unwrap();

        broker.publish(Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(
            recv_within(&mut healthy).await,
            Some(Bytes::from_static(b"x"))
        );

        // Only the stalled queue is full at the second publish: that
        // subscriber is evicted, the draining one is untouched
        broker.publish(Bytes::from_static(b"y")).await.unwrap();
        assert_eq!(
            recv_within(&mut healthy).await,
            Some(Bytes::from_static(b"y"))
        );
        assert_eq!(broker.subscriber_count().await.unwrap(), 1);

        // The evicted subscriber drains its first payload, then end-of-stream
        assert_eq!(
            recv_within(&mut stalled).await,
            Some(Bytes::from_static(b"x"))
        );
        assert_eq!(recv_within(&mut stalled).await, None);
    }

    #[tokio::test]
    async fn test_wait_policy_delivers_in_order() {
        let config = BrokerConfig::default().slow_subscriber_policy(SlowSubscriberPolicy::Wait);
        let (_task, broker) = Broker::spawn(config);

        let mut sub = broker.subscribe().await.unwrap();

        broker.publish(Bytes::from_static(b"1")).await.unwrap();
        broker.publish(Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(recv_within(&mut sub).await, Some(Bytes::from_static(b"1")));
        assert_eq!(recv_within(&mut sub).await, Some(Bytes::from_static(b"2")));
    }

    #[tokio::test]
    async fn test_shutdown_surfaces_error() {
        let (broker, handle) = Broker::new(BrokerConfig::default());
        drop(broker);

        assert_eq!(
            handle.publish(Bytes::from_static(b"x")).await,
            Err(BrokerError::Shutdown)
        );
        assert!(handle.subscribe().await.is_err());
    }
}
