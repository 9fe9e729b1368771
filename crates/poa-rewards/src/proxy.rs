//! Upgradeable reward entry point.
//!
//! [`RewardProxy`] is what the block-production pipeline calls. It binds a
//! [`StateStore`] to the currently attached [`RewardLogic`], checks the
//! caller against the [`AccessGate`], reads the time from a [`Clock`] and
//! commits state and event together.
//!
//! The logic can be replaced with [`RewardProxy::upgrade_to`]; the store,
//! and with it the rotation, carries over unchanged. Only the proxy storage
//! account may upgrade.

use std::sync::Arc;

use poa_registry::ValidatorKeyRegistry;
use poa_types::{Address, DistributionEvent, ProxyRecord, SchedulerState, Timestamp};

use crate::clock::Clock;
use crate::gate::AccessGate;
use crate::scheduler::RewardLogic;
use crate::store::StateStore;
use crate::{Result, RewardError};

/// Reward entry point with swappable logic.
pub struct RewardProxy<S: StateStore> {
    store: S,
    logic: Box<dyn RewardLogic>,
    gate: Box<dyn AccessGate>,
    clock: Arc<dyn Clock>,
    record: ProxyRecord,
}

impl<S: StateStore> RewardProxy<S> {
    /// Attach `logic` to `store`.
    ///
    /// A store without a proxy record is initialized with `logic` at version 1
    /// and `proxy_storage` as the upgrade authority. A store that already has
    /// a record must name the same implementation.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ImplementationMismatch`] if the store belongs to another implementation
    /// - [`RewardError::InvalidImplementation`] for an unnamed implementation
    pub fn open(
        mut store: S,
        logic: Box<dyn RewardLogic>,
        gate: Box<dyn AccessGate>,
        clock: Arc<dyn Clock>,
        proxy_storage: Address,
    ) -> Result<Self> {
        if logic.implementation().is_empty() {
            return Err(RewardError::InvalidImplementation);
        }
        let record = match store.load_proxy()? {
            Some(record) if record.implementation == logic.implementation() => record,
            Some(record) => {
                return Err(RewardError::ImplementationMismatch {
                    stored: record.implementation,
                    provided: logic.implementation().to_string(),
                })
            }
            None => {
                let record = ProxyRecord::new(logic.implementation(), proxy_storage);
                store.save_proxy(&record)?;
                tracing::info!(
                    implementation = %record.implementation,
                    proxy_storage = %record.proxy_storage,
                    "reward proxy initialized"
                );
                record
            }
        };

        Ok(Self {
            store,
            logic,
            gate,
            clock,
            record,
        })
    }

    /// Like [`open`](Self::open), but a store bound to another implementation
    /// is upgraded to `logic` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - [`RewardError::Unauthorized`] if an upgrade is needed and `caller` is not the proxy storage
    pub fn open_upgrading(
        mut store: S,
        logic: Box<dyn RewardLogic>,
        gate: Box<dyn AccessGate>,
        clock: Arc<dyn Clock>,
        proxy_storage: Address,
        caller: Address,
    ) -> Result<Self> {
        let Some(record) = store.load_proxy()? else {
            return Self::open(store, logic, gate, clock, proxy_storage);
        };
        if record.implementation == logic.implementation() {
            return Self::open(store, logic, gate, clock, proxy_storage);
        }

        let next = upgraded_record(&record, &caller, logic.implementation())?;
        store.save_proxy(&next)?;
        tracing::info!(
            from = %record.implementation,
            to = %next.implementation,
            version = next.version,
            "reward implementation upgraded on open"
        );
        Ok(Self {
            store,
            logic,
            gate,
            clock,
            record: next,
        })
    }

    /// Distribute rewards at the ambient clock's current time.
    pub fn reward(
        &mut self,
        caller: &Address,
        registry: &dyn ValidatorKeyRegistry,
    ) -> Result<DistributionEvent> {
        let now = self.clock.now();
        self.reward_at(caller, now, registry)
    }

    /// Distribute rewards as of `now`.
    ///
    /// Nothing is read or written unless the caller is authorized, and the
    /// new state and the event are committed together. A call within the
    /// current tick returns an empty event and commits nothing.
    ///
    /// # Errors
    ///
    /// - [`RewardError::Unauthorized`] if the gate rejects `caller`
    /// - [`RewardError::EmptyValidatorSet`] if the registry reports no payees
    /// - any error of the attached logic or the store
    pub fn reward_at(
        &mut self,
        caller: &Address,
        now: Timestamp,
        registry: &dyn ValidatorKeyRegistry,
    ) -> Result<DistributionEvent> {
        if !self.gate.is_authorized(caller) {
            tracing::warn!(%caller, "reward call rejected");
            return Err(RewardError::Unauthorized { caller: *caller });
        }

        let mut state = self.store.load_state()?;
        let event = self.logic.distribute(&mut state, registry, now)?;
        if event.is_noop() {
            return Ok(event);
        }

        self.store.commit(&state, &event)?;
        tracing::info!(
            kind = event.kind.as_str(),
            ticks = event.ticks,
            receivers = ?event.receivers(),
            last_reward_time = state.last_reward_time,
            cursor = state.rotation_cursor,
            "rewarded"
        );
        Ok(event)
    }

    /// Replace the attached logic, keeping the stored state.
    ///
    /// # Errors
    ///
    /// - [`RewardError::Unauthorized`] if `caller` is not the proxy storage
    /// - [`RewardError::SameImplementation`] if `logic` is already attached
    /// - [`RewardError::InvalidImplementation`] for an unnamed implementation
    pub fn upgrade_to(&mut self, caller: &Address, logic: Box<dyn RewardLogic>) -> Result<()> {
        let next = upgraded_record(&self.record, caller, logic.implementation())?;
        self.store.save_proxy(&next)?;
        tracing::info!(
            from = %self.record.implementation,
            to = %next.implementation,
            version = next.version,
            "reward implementation upgraded"
        );
        self.record = next;
        self.logic = logic;
        Ok(())
    }

    /// Hand upgrade authority to another account.
    ///
    /// # Errors
    ///
    /// - [`RewardError::Unauthorized`] if `caller` is not the current proxy storage
    pub fn set_proxy_storage(&mut self, caller: &Address, proxy_storage: Address) -> Result<()> {
        if *caller != self.record.proxy_storage {
            return Err(RewardError::Unauthorized { caller: *caller });
        }
        let mut next = self.record.clone();
        next.proxy_storage = proxy_storage;
        self.store.save_proxy(&next)?;
        self.record = next;
        Ok(())
    }

    /// Replace the access gate.
    pub fn set_gate(&mut self, gate: Box<dyn AccessGate>) {
        self.gate = gate;
    }

    /// Snapshot of the stored scheduler state.
    pub fn state(&self) -> Result<SchedulerState> {
        self.store.load_state()
    }

    /// Time the rotation was last advanced to; 0 before bootstrap.
    pub fn last_reward_time(&self) -> Result<Timestamp> {
        Ok(self.store.load_state()?.last_reward_time)
    }

    /// Position of the next payee.
    pub fn rotation_cursor(&self) -> Result<u64> {
        Ok(self.store.load_state()?.rotation_cursor)
    }

    /// Persisted payout key list.
    pub fn payout_keys(&self) -> Result<Vec<Address>> {
        Ok(self.store.load_state()?.payout_keys)
    }

    /// Committed distributions, oldest first.
    pub fn events(&self) -> Result<Vec<DistributionEvent>> {
        self.store.events()
    }

    /// Name of the attached implementation.
    pub fn implementation(&self) -> &str {
        &self.record.implementation
    }

    /// Implementation version, starting at 1.
    pub fn version(&self) -> u64 {
        self.record.version
    }

    /// Account allowed to upgrade.
    pub fn proxy_storage(&self) -> Address {
        self.record.proxy_storage
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Detach and return the store.
    pub fn into_store(self) -> S {
        self.store
    }
}

fn upgraded_record(current: &ProxyRecord, caller: &Address, target: &str) -> Result<ProxyRecord> {
    if *caller != current.proxy_storage {
        return Err(RewardError::Unauthorized { caller: *caller });
    }
    if target.is_empty() {
        return Err(RewardError::InvalidImplementation);
    }
    if target == current.implementation {
        return Err(RewardError::SameImplementation(target.to_string()));
    }
    let version = current.version.checked_add(1).ok_or(RewardError::Overflow)?;
    Ok(ProxyRecord {
        implementation: target.to_string(),
        version,
        proxy_storage: current.proxy_storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gate::SystemAddressGate;
    use crate::scheduler::{RewardParams, RewardScheduler};
    use crate::store::MemoryStore;
    use poa_types::SYSTEM_ADDRESS;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn admin() -> Address {
        addr(8)
    }

    fn logic(name: &str) -> Box<dyn RewardLogic> {
        Box::new(
            RewardScheduler::new(RewardParams::default())
                .expect("scheduler")
                .with_name(name),
        )
    }

    fn proxy(clock: Arc<ManualClock>) -> RewardProxy<MemoryStore> {
        RewardProxy::open(
            MemoryStore::new(),
            logic("reward-by-time"),
            Box::new(SystemAddressGate::default()),
            clock,
            admin(),
        )
        .expect("open")
    }

    fn validators() -> Vec<Address> {
        vec![addr(1), addr(2), addr(3)]
    }

    #[test]
    fn test_only_system_address_may_reward() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock);

        let result = proxy.reward(&addr(1), &validators());
        assert!(matches!(result, Err(RewardError::Unauthorized { .. })));
        assert_eq!(proxy.last_reward_time().expect("time"), 0);
        assert!(proxy.events().expect("events").is_empty());

        proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("reward");
        assert_eq!(proxy.last_reward_time().expect("time"), 100);
    }

    #[test]
    fn test_set_gate_moves_authority() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock);
        let system = addr(7);
        proxy.set_gate(Box::new(SystemAddressGate::new(system)));

        assert!(proxy.reward(&SYSTEM_ADDRESS, &validators()).is_err());
        proxy.reward(&system, &validators()).expect("reward");
    }

    #[test]
    fn test_reward_uses_ambient_clock() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock.clone());
        proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("bootstrap");

        clock.set(112);
        let event = proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("reward");
        assert_eq!(event.timestamp, 112);
        assert_eq!(event.ticks, 2);
        assert_eq!(proxy.last_reward_time().expect("time"), 110);
        assert_eq!(proxy.rotation_cursor().expect("cursor"), 0);
        assert_eq!(proxy.payout_keys().expect("keys"), validators());
    }

    #[test]
    fn test_noop_not_logged() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock.clone());
        proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("bootstrap");
        clock.advance(2);
        let event = proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("noop");
        assert!(event.is_noop());
        assert_eq!(proxy.events().expect("events").len(), 1);
    }

    #[test]
    fn test_failed_call_commits_nothing() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock.clone());
        proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("bootstrap");
        let before = proxy.state().expect("state");

        clock.set(200);
        let empty: Vec<Address> = Vec::new();
        assert!(proxy.reward(&SYSTEM_ADDRESS, &empty).is_err());
        assert_eq!(proxy.state().expect("state"), before);
        assert_eq!(proxy.events().expect("events").len(), 1);
    }

    #[test]
    fn test_upgrade_only_by_proxy_storage() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock);

        let result = proxy.upgrade_to(&addr(1), logic("reward-by-time-v2"));
        assert!(matches!(result, Err(RewardError::Unauthorized { .. })));
        assert_eq!(proxy.version(), 1);

        proxy
            .upgrade_to(&admin(), logic("reward-by-time-v2"))
            .expect("upgrade");
        assert_eq!(proxy.implementation(), "reward-by-time-v2");
        assert_eq!(proxy.version(), 2);
        assert_eq!(proxy.proxy_storage(), admin());
    }

    #[test]
    fn test_upgrade_rejects_same_or_unnamed() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock);
        assert!(matches!(
            proxy.upgrade_to(&admin(), logic("reward-by-time")),
            Err(RewardError::SameImplementation(_))
        ));
        assert!(matches!(
            proxy.upgrade_to(&admin(), logic("")),
            Err(RewardError::InvalidImplementation)
        ));
        assert_eq!(proxy.version(), 1);
    }

    #[test]
    fn test_upgrade_keeps_rotation() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock.clone());
        proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("bootstrap");
        let before = proxy.state().expect("state");

        proxy
            .upgrade_to(&admin(), logic("reward-by-time-v2"))
            .expect("upgrade");
        assert_eq!(proxy.state().expect("state"), before);

        clock.set(105);
        let event = proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("reward");
        assert_eq!(event.receivers()[0], addr(2));
    }

    #[test]
    fn test_reopen_requires_matching_implementation() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock.clone());
        proxy.reward(&SYSTEM_ADDRESS, &validators()).expect("bootstrap");
        let store = proxy.into_store();

        let result = RewardProxy::open(
            store.clone(),
            logic("other"),
            Box::new(SystemAddressGate::default()),
            clock.clone(),
            admin(),
        );
        assert!(matches!(
            result,
            Err(RewardError::ImplementationMismatch { .. })
        ));

        let reopened = RewardProxy::open(
            store,
            logic("reward-by-time"),
            Box::new(SystemAddressGate::default()),
            clock,
            admin(),
        )
        .expect("reopen");
        assert_eq!(reopened.last_reward_time().expect("time"), 100);
    }

    #[test]
    fn test_open_upgrading() {
        let clock = Arc::new(ManualClock::new(100));
        let store = proxy(clock.clone()).into_store();

        let result = RewardProxy::open_upgrading(
            store.clone(),
            logic("reward-by-time-v2"),
            Box::new(SystemAddressGate::default()),
            clock.clone(),
            admin(),
            addr(1),
        );
        assert!(matches!(result, Err(RewardError::Unauthorized { .. })));

        let upgraded = RewardProxy::open_upgrading(
            store,
            logic("reward-by-time-v2"),
            Box::new(SystemAddressGate::default()),
            clock,
            admin(),
            admin(),
        )
        .expect("open upgrading");
        assert_eq!(upgraded.version(), 2);
        assert_eq!(upgraded.implementation(), "reward-by-time-v2");
    }

    #[test]
    fn test_set_proxy_storage() {
        let clock = Arc::new(ManualClock::new(100));
        let mut proxy = proxy(clock);
        assert!(proxy.set_proxy_storage(&addr(1), addr(9)).is_err());
        proxy.set_proxy_storage(&admin(), addr(9)).expect("set");
        assert_eq!(proxy.proxy_storage(), addr(9));
        assert!(proxy
            .upgrade_to(&admin(), logic("reward-by-time-v2"))
            .is_err());
        proxy
            .upgrade_to(&addr(9), logic("reward-by-time-v2"))
            .expect("upgrade");
    }
}
