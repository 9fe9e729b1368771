//! # poa-rewards
//!
//! Time-sliced, round-robin reward distribution for proof-of-authority
//! validators.
//!
//! Every reward call converts the time elapsed since the last paid tick into
//! a whole number of ticks, pays one block reward per tick to consecutive
//! positions of the payout key list, and appends the treasury's share for
//! the same ticks as the final line.
//!
//! ## Modules
//!
//! - [`cache`]: Payout key list synchronization with the validator registry
//! - [`scheduler`]: Tick arithmetic and payee rotation
//! - [`treasury`]: Treasury line item
//! - [`gate`]: Caller authorization
//! - [`clock`]: Ambient time source
//! - [`store`]: Persistent state boundary
//! - [`proxy`]: Upgradeable entry point binding state, logic and gate

pub mod cache;
pub mod clock;
pub mod gate;
pub mod proxy;
pub mod scheduler;
pub mod store;
pub mod treasury;

use poa_registry::RegistryError;
use poa_types::Address;

pub use cache::PayoutKeyCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{AccessGate, SystemAddressGate};
pub use proxy::RewardProxy;
pub use scheduler::{RefreshPolicy, RewardLogic, RewardParams, RewardScheduler};
pub use store::{MemoryStore, StateStore};
pub use treasury::TreasuryAllocator;

/// Error types for reward distribution.
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    /// Caller is not allowed to perform the operation.
    #[error("unauthorized caller: {caller}")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// The refreshed payout key list is empty.
    #[error("validator set is empty")]
    EmptyValidatorSet,

    /// Timestamp cannot seed the rotation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(u64),

    /// Scheduler parameters are unusable.
    #[error("invalid reward configuration: {0}")]
    InvalidConfig(String),

    /// Arithmetic overflow in time or amount calculation.
    #[error("arithmetic overflow in reward calculation")]
    Overflow,

    /// Upgrade target is already the current implementation.
    #[error("implementation already active: {0}")]
    SameImplementation(String),

    /// Upgrade target has no name.
    #[error("implementation name must not be empty")]
    InvalidImplementation,

    /// Stored state belongs to a different implementation.
    #[error("state is bound to implementation {stored}, got {provided}")]
    ImplementationMismatch {
        /// Implementation recorded in the store.
        stored: String,
        /// Implementation offered on open.
        provided: String,
    },

    /// The validator registry could not be queried.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The state store failed.
    #[error("state store error: {0}")]
    Store(String),
}

/// Convenience result type for reward operations.
pub type Result<T> = std::result::Result<T, RewardError>;
