//! # poa-types
//!
//! Shared domain types used across the poa-rewards workspace: account
//! addresses, reward amounts, distribution events and the persistent
//! scheduler state record.

pub mod address;
pub mod distribution;
pub mod state;

pub use address::{Address, AddressError};
pub use distribution::{DistributionEvent, DistributionKind, Payment};
pub use state::{ProxyRecord, SchedulerState};

/// Fixed-point reward amount in the smallest unit (10^18 per coin).
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Smallest units per coin.
pub const WEI_PER_COIN: Amount = 1_000_000_000_000_000_000;

/// Default tick length in seconds.
pub const DEFAULT_THRESHOLD_SECS: u64 = 5;

/// Default reward credited to one payee per tick (1 coin).
pub const DEFAULT_BLOCK_REWARD: Amount = WEI_PER_COIN;

/// Default treasury credit per tick (1 coin).
pub const DEFAULT_TREASURY_UNIT: Amount = WEI_PER_COIN;

/// Default cap on ticks paid by a single distribution call.
pub const DEFAULT_MAX_TICKS_PER_CALL: u64 = 1024;

/// Largest tick cap a scheduler accepts.
pub const MAX_TICKS_PER_CALL: u64 = 65_536;

/// Conventional system account that drives block rewards on PoA chains.
pub const SYSTEM_ADDRESS: Address = Address([
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xfe,
]);
