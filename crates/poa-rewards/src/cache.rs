//! Payout key list synchronization.
//!
//! The scheduler keeps its own ordered copy of the registry's payout
//! addresses. A refresh folds the registry's current answer into that copy:
//! survivors keep their relative order, departed addresses are dropped and
//! newcomers are appended. The rotation cursor is positional, so no cursor
//! remapping happens here.

use std::collections::BTreeSet;

use poa_registry::ValidatorKeyRegistry;
use poa_types::Address;

use crate::Result;

/// Ordered, duplicate-free snapshot of active payout addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PayoutKeyCache {
    keys: Vec<Address>,
}

impl PayoutKeyCache {
    /// Start from a previously persisted list.
    pub fn new(keys: Vec<Address>) -> Self {
        Self { keys }
    }

    /// Current list in rotation order.
    pub fn keys(&self) -> &[Address] {
        &self.keys
    }

    /// Number of payees.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there is no payee to rotate over.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Address at `position`, taken modulo the list length.
    pub fn at(&self, position: u64) -> Option<Address> {
        let len = self.keys.len() as u64;
        if len == 0 {
            return None;
        }
        self.keys.get((position % len) as usize).copied()
    }

    /// Consume the cache, returning the list.
    pub fn into_keys(self) -> Vec<Address> {
        self.keys
    }

    /// Sync with the registry and return the resulting list.
    pub fn refresh(&mut self, registry: &dyn ValidatorKeyRegistry) -> Result<&[Address]> {
        let active = registry.active_payout_addresses()?;
        let merged = merge(&self.keys, &active);
        if merged != self.keys {
            tracing::debug!(
                before = self.keys.len(),
                after = merged.len(),
                "payout key list changed"
            );
            self.keys = merged;
        }
        Ok(&self.keys)
    }
}

/// Fold `active` into `current`.
///
/// The result holds each address of `active` exactly once: entries already
/// in `current` in their existing order, then the rest in `active` order.
pub fn merge(current: &[Address], active: &[Address]) -> Vec<Address> {
    let active_set: BTreeSet<Address> = active.iter().copied().collect();
    let mut seen = BTreeSet::new();
    let mut merged = Vec::with_capacity(active_set.len());

    for key in current {
        if active_set.contains(key) && seen.insert(*key) {
            merged.push(*key);
        }
    }
    for key in active {
        if seen.insert(*key) {
            merged.push(*key);
        }
    }
    merged
}
