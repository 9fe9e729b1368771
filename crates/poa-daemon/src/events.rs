//! Event emission.
//!
//! Every committed distribution is broadcast to in-process subscribers.
//! Each subscriber has an independent buffer; slow subscribers lag and
//! lose the oldest events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use poa_types::DistributionEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event type for a committed distribution.
pub const REWARDS_DISTRIBUTED: &str = "RewardsDistributed";

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "RewardsDistributed", "DaemonStarted").
    pub event_type: String,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

impl Event {
    /// Wrap a distribution. Amounts appear as decimal strings.
    pub fn distribution(event: &DistributionEvent) -> serde_json::Result<Self> {
        Ok(Self {
            event_type: REWARDS_DISTRIBUTED.to_string(),
            timestamp: event.timestamp,
            payload: serde_json::to_value(event)?,
        })
    }
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}
