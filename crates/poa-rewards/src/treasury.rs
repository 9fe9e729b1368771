//! Treasury line item.
//!
//! The treasury earns a fixed unit per paid tick, settled as a single
//! aggregated line at the end of each distribution event.

use poa_types::{Address, Amount, Payment};

use crate::{Result, RewardError};

/// Computes the treasury's share of a distribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreasuryAllocator {
    address: Address,
    unit: Amount,
}

impl TreasuryAllocator {
    /// Credit `unit` per tick to `address`.
    pub fn new(address: Address, unit: Amount) -> Self {
        Self { address, unit }
    }

    /// Treasury account.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Amount credited per tick.
    pub fn unit(&self) -> Amount {
        self.unit
    }

    /// `unit * ticks`.
    ///
    /// # Errors
    ///
    /// - [`RewardError::Overflow`] if the product exceeds `u128`
    pub fn share_for(&self, ticks: u64) -> Result<Amount> {
        self.unit
            .checked_mul(u128::from(ticks))
            .ok_or(RewardError::Overflow)
    }

    /// The treasury line for `ticks`, or `None` when nothing was paid.
    pub fn line_for(&self, ticks: u64) -> Result<Option<Payment>> {
        if ticks == 0 {
            return Ok(None);
        }
        Ok(Some(Payment::new(self.address, self.share_for(ticks)?)))
    }
}
