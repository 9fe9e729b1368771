//! Block-production trigger.
//!
//! Stands in for the consensus engine: on every interval tick the daemon
//! calls the reward proxy as the system address and broadcasts whatever
//! was distributed.

use std::sync::Arc;
use std::time::Duration;

use poa_registry::ValidatorKeyRegistry;
use poa_rewards::{
    Clock, RewardError, RewardProxy, RewardScheduler, StateStore, SystemAddressGate,
};
use poa_types::{Address, DistributionEvent};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::events::{Event, EventBus};

/// Attach the configured scheduler to `store`.
///
/// A store bound to another implementation is upgraded when
/// `[upgrade] caller` is set, and rejected otherwise.
pub fn build_proxy<S: StateStore>(
    config: &DaemonConfig,
    store: S,
    clock: Arc<dyn Clock>,
) -> poa_rewards::Result<RewardProxy<S>> {
    let logic = Box::new(
        RewardScheduler::new(config.rewards.clone())?
            .with_name(config.upgrade.implementation.clone()),
    );
    let gate = Box::new(SystemAddressGate::new(config.access.system_address));
    match config.upgrade.caller {
        Some(caller) => RewardProxy::open_upgrading(
            store,
            logic,
            gate,
            clock,
            config.access.proxy_storage,
            caller,
        ),
        None => RewardProxy::open(store, logic, gate, clock, config.access.proxy_storage),
    }
}

/// One block: call the proxy and broadcast a non-empty distribution.
///
/// Failures are logged and leave the stored state untouched; the next tick
/// retries from the same state.
pub fn reward_once<S: StateStore>(
    proxy: &mut RewardProxy<S>,
    registry: &dyn ValidatorKeyRegistry,
    caller: &Address,
    bus: &EventBus,
) -> Option<DistributionEvent> {
    match proxy.reward(caller, registry) {
        Ok(event) if event.is_noop() => None,
        Ok(event) => {
            match Event::distribution(&event) {
                Ok(wrapped) => bus.emit(wrapped),
                Err(e) => warn!(error = %e, "failed to encode distribution event"),
            }
            Some(event)
        }
        Err(RewardError::EmptyValidatorSet) => {
            warn!("no active validators; distribution skipped");
            None
        }
        Err(e) => {
            warn!(error = %e, "reward call failed");
            None
        }
    }
}

/// Call [`reward_once`] every `period` until the future is dropped.
pub async fn run<S: StateStore>(
    mut proxy: RewardProxy<S>,
    registry: &dyn ValidatorKeyRegistry,
    caller: Address,
    bus: EventBus,
    period: Duration,
) {
    info!(
        implementation = proxy.implementation(),
        version = proxy.version(),
        period_secs = period.as_secs(),
        "reward trigger running"
    );
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        reward_once(&mut proxy, registry, &caller, &bus);
    }
}
