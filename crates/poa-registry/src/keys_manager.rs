//! In-memory validator key registry.
//!
//! Mirrors the two-phase model of PoA consensus: key additions and removals
//! edit a *pending* validator list, and [`KeysManager::finalize_change`]
//! promotes it to the active list that reward distribution sees.
//!
//! Each validator is identified by its mining key. A validator may register a
//! separate payout key; without one, rewards go to the mining key itself. The
//! master of ceremony is the initial validator and is never removed, so the
//! active list always has at least one payee. Removing an active validator
//! keeps its payout key in effect for the active list until the change is
//! finalized.

use std::collections::BTreeMap;

use poa_types::Address;

use crate::{RegistryError, Result, ValidatorKeyRegistry, MAX_VALIDATORS};

/// In-memory registry of mining keys and their payout keys.
#[derive(Clone, Debug)]
pub struct KeysManager {
    master_of_ceremony: Address,
    /// Mining keys awaiting finalization.
    pending: Vec<Address>,
    /// Mining keys currently active.
    finalized: Vec<Address>,
    /// Mining key -> payout key.
    payout_keys: BTreeMap<Address, Address>,
    /// Payout keys of active validators removed from the pending set.
    retired_payout_keys: BTreeMap<Address, Address>,
}

impl KeysManager {
    /// Create a registry whose only validator is the master of ceremony.
    pub fn new(master_of_ceremony: Address) -> Self {
        Self {
            master_of_ceremony,
            pending: vec![master_of_ceremony],
            finalized: vec![master_of_ceremony],
            payout_keys: BTreeMap::new(),
            retired_payout_keys: BTreeMap::new(),
        }
    }

    /// The initial, irremovable validator.
    pub fn master_of_ceremony(&self) -> Address {
        self.master_of_ceremony
    }

    /// Mining keys in the active set.
    pub fn validators(&self) -> &[Address] {
        &self.finalized
    }

    /// Mining keys in the pending set.
    pub fn pending_validators(&self) -> &[Address] {
        &self.pending
    }

    /// Whether the pending set differs from the active set.
    pub fn is_change_pending(&self) -> bool {
        self.pending != self.finalized
    }

    /// Payout key registered for a mining key.
    pub fn payout_key(&self, mining_key: &Address) -> Option<Address> {
        self.payout_keys.get(mining_key).copied()
    }

    /// Add a mining key to the pending validator set.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ZeroAddress`] for the zero address
    /// - [`RegistryError::AlreadyExists`] if the key is already pending
    /// - [`RegistryError::LimitReached`] at [`MAX_VALIDATORS`]
    pub fn add_mining_key(&mut self, mining_key: Address) -> Result<()> {
        if mining_key.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if self.pending.contains(&mining_key) {
            return Err(RegistryError::AlreadyExists(mining_key));
        }
        if self.pending.len() >= MAX_VALIDATORS {
            return Err(RegistryError::LimitReached {
                max: MAX_VALIDATORS,
            });
        }
        self.pending.push(mining_key);
        tracing::info!(%mining_key, "mining key added to pending set");
        Ok(())
    }

    /// Remove a mining key (and its payout key) from the pending set.
    ///
    /// The last pending key takes the removed key's slot, as in the
    /// consensus contract; consumers must not rely on registry order being
    /// stable across removals.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MasterOfCeremony`] for the master of ceremony
    /// - [`RegistryError::NotFound`] if the key is not pending
    pub fn remove_mining_key(&mut self, mining_key: Address) -> Result<()> {
        if mining_key == self.master_of_ceremony {
            return Err(RegistryError::MasterOfCeremony(mining_key));
        }
        let index = self
            .pending
            .iter()
            .position(|k| *k == mining_key)
            .ok_or(RegistryError::NotFound(mining_key))?;
        self.pending.swap_remove(index);
        if let Some(payout_key) = self.payout_keys.remove(&mining_key) {
            if self.finalized.contains(&mining_key) {
                self.retired_payout_keys
                    .entry(mining_key)
                    .or_insert(payout_key);
            }
        }
        tracing::info!(%mining_key, "mining key removed from pending set");
        Ok(())
    }

    /// Register `payout_key` as the reward address of `mining_key`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ZeroAddress`] for a zero payout key
    /// - [`RegistryError::MasterOfCeremony`] for the master of ceremony
    /// - [`RegistryError::NotFound`] if `mining_key` is not pending
    /// - [`RegistryError::AlreadyExists`] if another validator uses `payout_key`
    pub fn add_payout_key(&mut self, payout_key: Address, mining_key: Address) -> Result<()> {
        if payout_key.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if mining_key == self.master_of_ceremony {
            return Err(RegistryError::MasterOfCeremony(mining_key));
        }
        if !self.pending.contains(&mining_key) {
            return Err(RegistryError::NotFound(mining_key));
        }
        let taken = self
            .payout_keys
            .iter()
            .chain(&self.retired_payout_keys)
            .any(|(m, p)| *p == payout_key && *m != mining_key);
        if taken {
            return Err(RegistryError::AlreadyExists(payout_key));
        }
        self.payout_keys.insert(mining_key, payout_key);
        tracing::info!(%mining_key, %payout_key, "payout key registered");
        Ok(())
    }

    /// Drop the payout key of `mining_key`; rewards fall back to the mining key.
    pub fn remove_payout_key(&mut self, mining_key: Address) -> Result<()> {
        self.payout_keys
            .remove(&mining_key)
            .map(|_| ())
            .ok_or(RegistryError::NotFound(mining_key))
    }

    /// Promote the pending validator set to the active set.
    ///
    /// Returns `false` when there was nothing to finalize.
    pub fn finalize_change(&mut self) -> bool {
        if !self.is_change_pending() {
            return false;
        }
        self.finalized = self.pending.clone();
        self.retired_payout_keys.clear();
        tracing::info!(validators = self.finalized.len(), "validator set finalized");
        true
    }

    /// Reward address of an active validator.
    fn payout_address(&self, mining_key: &Address) -> Address {
        self.retired_payout_keys
            .get(mining_key)
            .copied()
            .or_else(|| self.payout_key(mining_key))
            .unwrap_or(*mining_key)
    }
}

impl ValidatorKeyRegistry for KeysManager {
    fn active_payout_addresses(&self) -> Result<Vec<Address>> {
        Ok(self
            .finalized
            .iter()
            .map(|m| self.payout_address(m))
            .collect())
    }
}
