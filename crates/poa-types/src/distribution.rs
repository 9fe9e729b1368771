//! Distribution events.
//!
//! One [`DistributionEvent`] records the outcome of one reward call: the
//! ordered `(payee, amount)` lines, validators first in rotation order and
//! the treasury aggregate last.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Address, Amount, Timestamp};

/// A single credited line item.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payee: Address,
    /// Decimal string in JSON, since `u128` does not fit JSON numbers.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

impl Payment {
    pub fn new(payee: Address, amount: Amount) -> Self {
        Self { payee, amount }
    }
}

/// Which branch of the scheduler produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// First-ever call; seeds the rotation.
    Bootstrap,
    /// Regular call after bootstrap.
    Steady,
}

impl DistributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionKind::Bootstrap => "bootstrap",
            DistributionKind::Steady => "steady",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bootstrap" => Some(DistributionKind::Bootstrap),
            "steady" => Some(DistributionKind::Steady),
            _ => None,
        }
    }
}

/// Immutable record of one distribution call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEvent {
    pub kind: DistributionKind,
    /// The `now` the call was evaluated at.
    pub timestamp: Timestamp,
    /// Ticks paid by this call. Zero for a no-op.
    pub ticks: u64,
    /// Validator lines followed by the treasury line. Empty iff `ticks == 0`.
    pub payments: Vec<Payment>,
}

impl DistributionEvent {
    /// A steady-state call that fell within the current tick window.
    pub fn noop(timestamp: Timestamp) -> Self {
        Self {
            kind: DistributionKind::Steady,
            timestamp,
            ticks: 0,
            payments: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.ticks == 0
    }

    /// Payees in line order, treasury last.
    pub fn receivers(&self) -> Vec<Address> {
        self.payments.iter().map(|p| p.payee).collect()
    }

    /// Amounts in line order, treasury last.
    pub fn rewards(&self) -> Vec<Amount> {
        self.payments.iter().map(|p| p.amount).collect()
    }

    /// Validator lines only.
    pub fn validator_payments(&self) -> &[Payment] {
        match self.payments.split_last() {
            Some((_, validators)) => validators,
            None => &[],
        }
    }

    /// The trailing treasury line, if any ticks were paid.
    pub fn treasury_payment(&self) -> Option<&Payment> {
        self.payments.last()
    }

    /// Sum of all lines, `None` on overflow.
    pub fn total(&self) -> Option<Amount> {
        self.payments
            .iter()
            .try_fold(0u128, |acc, p| acc.checked_add(p.amount))
    }
}
