//! Broker configuration

/// Policy applied when a subscriber's delivery queue is full at publish time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowSubscriberPolicy {
    /// Wait for the subscriber to drain its queue. One stalled reader delays
    /// delivery to every other subscriber for the duration of the publish.
    Wait,
    /// Drop the payload for that subscriber only.
    #[default]
    Drop,
    /// Evict the subscriber from the registry.
    Disconnect,
}

/// Broker configuration options
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Capacity of the command channel shared by all handles
    pub command_capacity: usize,

    /// Capacity of each subscriber's private delivery queue
    pub subscriber_capacity: usize,

    /// What to do with a subscriber whose delivery queue is full
    pub slow_subscriber_policy: SlowSubscriberPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            subscriber_capacity: 16,
            slow_subscriber_policy: SlowSubscriberPolicy::default(),
        }
    }
}

impl BrokerConfig {
    /// Set the command channel capacity (floored at 1)
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    /// Set the per-subscriber queue capacity (floored at 1)
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.max(1);
        self
    }

    /// Set the slow-subscriber policy
    pub fn slow_subscriber_policy(mut self, policy: SlowSubscriberPolicy) -> Self {
        self.slow_subscriber_policy = policy;
        self
    }
}
