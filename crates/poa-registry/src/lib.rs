//! # poa-registry
//!
//! Validator key registry: the source of truth for which validators are
//! active and where their rewards are paid.
//!
//! The reward scheduler only consumes [`ValidatorKeyRegistry`]; deciding
//! who becomes a validator (voting, ballots) happens elsewhere and lands
//! here as key additions and removals.
//!
//! ## Modules
//!
//! - [`keys_manager`]: In-memory mining/payout key registry with pending and finalized sets
//! - [`file`]: Validator set read from a TOML file on every query

pub mod file;
pub mod keys_manager;

use poa_types::Address;

pub use file::FileRegistry;
pub use keys_manager::KeysManager;

/// Maximum number of validators a registry will hold.
pub const MAX_VALIDATORS: usize = 2000;

/// Error types for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Key is already registered.
    #[error("key already registered: {0}")]
    AlreadyExists(Address),

    /// Key is not registered.
    #[error("key not found: {0}")]
    NotFound(Address),

    /// The master of ceremony cannot be removed or re-keyed.
    #[error("master of ceremony key cannot be modified: {0}")]
    MasterOfCeremony(Address),

    /// The zero address is not a valid key.
    #[error("zero address is not a valid key")]
    ZeroAddress,

    /// Validator limit reached.
    #[error("validator limit reached ({max})")]
    LimitReached {
        /// The configured maximum.
        max: usize,
    },

    /// Reading the validator set failed.
    #[error("validator set I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The validator set file is malformed.
    #[error("validator set parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Convenience result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Read side of the registry consumed by the reward scheduler.
pub trait ValidatorKeyRegistry {
    /// Payout addresses of the currently active validators, in registry order.
    fn active_payout_addresses(&self) -> Result<Vec<Address>>;
}

impl<T: ValidatorKeyRegistry + ?Sized> ValidatorKeyRegistry for &T {
    fn active_payout_addresses(&self) -> Result<Vec<Address>> {
        (**self).active_payout_addresses()
    }
}

/// A fixed list acts as a registry whose membership never changes.
impl ValidatorKeyRegistry for [Address] {
    fn active_payout_addresses(&self) -> Result<Vec<Address>> {
        Ok(self.to_vec())
    }
}

impl ValidatorKeyRegistry for Vec<Address> {
    fn active_payout_addresses(&self) -> Result<Vec<Address>> {
        Ok(self.clone())
    }
}
