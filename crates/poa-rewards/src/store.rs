//! Persistent state boundary.
//!
//! The scheduler state, the proxy record and the event log live behind
//! [`StateStore`], independent of whichever [`RewardLogic`](crate::RewardLogic)
//! is attached. Swapping the logic never touches the store.

use poa_types::{DistributionEvent, ProxyRecord, SchedulerState};

use crate::Result;

/// Storage for scheduler state and the distribution log.
pub trait StateStore {
    /// Current state; a fresh store returns the default state.
    fn load_state(&self) -> Result<SchedulerState>;

    /// Persist `state` and append `event` as one atomic unit.
    fn commit(&mut self, state: &SchedulerState, event: &DistributionEvent) -> Result<()>;

    /// Proxy record, if the store has been bound to an implementation.
    fn load_proxy(&self) -> Result<Option<ProxyRecord>>;

    /// Insert or replace the proxy record.
    fn save_proxy(&mut self, record: &ProxyRecord) -> Result<()>;

    /// Committed events, oldest first.
    fn events(&self) -> Result<Vec<DistributionEvent>>;
}

/// In-process store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: SchedulerState,
    proxy: Option<ProxyRecord>,
    events: Vec<DistributionEvent>,
}

impl MemoryStore {
    /// Empty store: not bootstrapped, no proxy record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, e.g. one carried over from another store.
    pub fn with_state(state: SchedulerState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

impl StateStore for MemoryStore {
    fn load_state(&self) -> Result<SchedulerState> {
        Ok(self.state.clone())
    }

    fn commit(&mut self, state: &SchedulerState, event: &DistributionEvent) -> Result<()> {
        self.state = state.clone();
        self.events.push(event.clone());
        Ok(())
    }

    fn load_proxy(&self) -> Result<Option<ProxyRecord>> {
        Ok(self.proxy.clone())
    }

    fn save_proxy(&mut self, record: &ProxyRecord) -> Result<()> {
        self.proxy = Some(record.clone());
        Ok(())
    }

    fn events(&self) -> Result<Vec<DistributionEvent>> {
        Ok(self.events.clone())
    }
}
