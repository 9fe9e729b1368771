//! Persistent scheduler state.
//!
//! The state record is owned independently of the logic that mutates it, so
//! a replacement implementation can attach to the same record and keep
//! rotating where the previous one stopped.

use serde::{Deserialize, Serialize};

use crate::{Address, Timestamp};

/// Rotation state carried across calls and across implementation upgrades.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    /// When the cursor was last advanced. `0` means never bootstrapped.
    pub last_reward_time: Timestamp,
    /// Next position to pay in `payout_keys`.
    pub rotation_cursor: u64,
    /// Cached payout addresses in registration order.
    pub payout_keys: Vec<Address>,
}

impl SchedulerState {
    pub fn is_bootstrapped(&self) -> bool {
        self.last_reward_time != 0
    }
}

/// Upgrade-proxy bookkeeping stored next to the scheduler state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    /// Name of the logic implementation currently attached.
    pub implementation: String,
    /// Starts at 1, bumped by every upgrade.
    pub version: u64,
    /// The only account allowed to upgrade the implementation.
    pub proxy_storage: Address,
}

impl ProxyRecord {
    pub fn new(implementation: impl Into<String>, proxy_storage: Address) -> Self {
        Self {
            implementation: implementation.into(),
            version: 1,
            proxy_storage,
        }
    }
}
