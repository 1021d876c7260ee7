//! Broadcast broker for live state fan-out
//!
//! The broker owns the subscriber registry and relays every published payload
//! to all registered subscribers. All registry access is confined to a single
//! event loop task, so registration, deregistration and publishing are
//! totally ordered and no lock exists anywhere.
//!
//! # Architecture
//!
//! ```text
//!                     BrokerHandle (Clone)
//!            subscribe() / deregister() / publish()
//!                            │
//!                            ▼  mpsc command channel
//!                 ┌─────────────────────────┐
//!                 │ Broker::run             │
//!                 │   subscribers:          │
//!                 │     HashMap<Id, Sender> │
//!                 └───────────┬─────────────┘
//!                             │ one bounded queue per subscriber
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//!   [Subscription]      [Subscription]      [Subscription]
//!   recv() → SSE        recv() → SSE        recv() → SSE
//! ```
//!
//! # Delivery semantics
//!
//! A publish is delivered to exactly the subscribers registered at the moment
//! the loop picks the command up: best effort, at most once per subscriber.
//! What happens when a subscriber's queue is full is an explicit policy
//! ([`SlowSubscriberPolicy`]); the default drops the payload for that
//! subscriber so that one stalled reader can never delay the rest.
//!
//! `bytes::Bytes` payloads are reference counted, so fan-out clones share one
//! allocation.

pub mod config;
pub mod core;
pub mod error;
pub mod subscription;

pub use config::{BrokerConfig, SlowSubscriberPolicy};
pub use core::{Broker, BrokerHandle, SubscriberId};
pub use error::BrokerError;
pub use subscription::Subscription;
