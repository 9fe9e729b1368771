//! Caller authorization.

use poa_types::{Address, SYSTEM_ADDRESS};

/// Decides whether a caller may trigger reward distribution.
pub trait AccessGate: Send + Sync {
    /// Whether `caller` may distribute.
    fn is_authorized(&self, caller: &Address) -> bool;
}

/// Authorizes exactly one account: the chain's system address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemAddressGate {
    system_address: Address,
}

impl SystemAddressGate {
    /// Gate admitting only `system_address`.
    pub fn new(system_address: Address) -> Self {
        Self { system_address }
    }

    /// The authorized account.
    pub fn system_address(&self) -> Address {
        self.system_address
    }

    /// Move authorization to another account.
    pub fn set_system_address(&mut self, system_address: Address) {
        tracing::info!(%system_address, "system address changed");
        self.system_address = system_address;
    }
}

impl Default for SystemAddressGate {
    fn default() -> Self {
        Self::new(SYSTEM_ADDRESS)
    }
}

impl AccessGate for SystemAddressGate {
    fn is_authorized(&self, caller: &Address) -> bool {
        *caller == self.system_address
    }
}
