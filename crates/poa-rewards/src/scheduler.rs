//! Tick arithmetic and payee rotation.
//!
//! ## Algorithm
//!
//! ```text
//! bootstrap (last_reward_time == 0):
//!     pay keys[0]; cursor = 1 mod N; last_reward_time = now
//! steady:
//!     ticks = min((now - last_reward_time) / threshold, max_ticks_per_call)
//!     pay keys[(cursor + i) mod N] for i in 0..ticks
//!     last_reward_time += threshold * ticks
//!     cursor = (cursor + ticks) mod N
//! ```
//!
//! `last_reward_time` only moves in whole ticks, so the unpaid remainder of
//! the current tick carries over to the next call. Each paid tick also
//! credits one treasury unit, settled as the final line of the event.

use poa_registry::ValidatorKeyRegistry;
use poa_types::{
    Address, Amount, DistributionEvent, DistributionKind, Payment, SchedulerState, Timestamp,
    DEFAULT_BLOCK_REWARD, DEFAULT_MAX_TICKS_PER_CALL, DEFAULT_THRESHOLD_SECS,
    DEFAULT_TREASURY_UNIT, MAX_TICKS_PER_CALL,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::cache::PayoutKeyCache;
use crate::treasury::TreasuryAllocator;
use crate::{Result, RewardError};

/// Name of the stock implementation.
pub const DEFAULT_IMPLEMENTATION: &str = "reward-by-time";

/// When the payout key list is synchronized with the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// At the start of every call.
    #[default]
    EveryCall,
    /// Only when the cursor runs off the end of the list, which then
    /// restarts the rotation at position 0. Membership changes take effect
    /// at round boundaries.
    OnWrap,
}

/// Scheduler parameters.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Seconds per tick.
    #[serde(default = "default_threshold")]
    pub threshold_secs: u64,
    /// Credited to one payee per tick.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_block_reward")]
    pub block_reward: Amount,
    /// Credited to the treasury per tick.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_treasury_unit")]
    pub treasury_unit: Amount,
    #[serde(default)]
    pub treasury_address: Address,
    /// Ticks beyond this are left for later calls.
    #[serde(default = "default_max_ticks")]
    pub max_ticks_per_call: u64,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
}

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD_SECS
}

fn default_block_reward() -> Amount {
    DEFAULT_BLOCK_REWARD
}

fn default_treasury_unit() -> Amount {
    DEFAULT_TREASURY_UNIT
}

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS_PER_CALL
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            threshold_secs: default_threshold(),
            block_reward: default_block_reward(),
            treasury_unit: default_treasury_unit(),
            treasury_address: Address::ZERO,
            max_ticks_per_call: default_max_ticks(),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl RewardParams {
    /// Reject parameters the scheduler cannot run with.
    ///
    /// # Errors
    ///
    /// - [`RewardError::InvalidConfig`] for a zero threshold, a zero tick cap or
    ///   a tick cap above [`MAX_TICKS_PER_CALL`]
    pub fn validate(&self) -> Result<()> {
        if self.threshold_secs == 0 {
            return Err(RewardError::InvalidConfig(
                "threshold must be positive".to_string(),
            ));
        }
        if self.max_ticks_per_call == 0 {
            return Err(RewardError::InvalidConfig(
                "max_ticks_per_call must be positive".to_string(),
            ));
        }
        if self.max_ticks_per_call > MAX_TICKS_PER_CALL {
            return Err(RewardError::InvalidConfig(format!(
                "max_ticks_per_call must not exceed {MAX_TICKS_PER_CALL}"
            )));
        }
        Ok(())
    }
}

/// Replaceable reward logic attached to a persistent [`SchedulerState`].
pub trait RewardLogic: Send + Sync {
    /// Identifies the implementation across upgrades.
    fn implementation(&self) -> &str;

    /// Run one distribution against `state`.
    ///
    /// On error `state` must be left untouched.
    fn distribute(
        &self,
        state: &mut SchedulerState,
        registry: &dyn ValidatorKeyRegistry,
        now: Timestamp,
    ) -> Result<DistributionEvent>;
}

/// Round-robin, time-sliced reward scheduler.
#[derive(Clone, Debug)]
pub struct RewardScheduler {
    name: String,
    params: RewardParams,
    treasury: TreasuryAllocator,
}

impl RewardScheduler {
    /// # Errors
    ///
    /// - [`RewardError::InvalidConfig`] if `params` fail validation
    pub fn new(params: RewardParams) -> Result<Self> {
        params.validate()?;
        let treasury = TreasuryAllocator::new(params.treasury_address, params.treasury_unit);
        Ok(Self {
            name: DEFAULT_IMPLEMENTATION.to_string(),
            params,
            treasury,
        })
    }

    /// Rename the implementation, e.g. for an upgrade.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parameters the scheduler was built with.
    pub fn params(&self) -> &RewardParams {
        &self.params
    }

    /// Treasury share calculator.
    pub fn treasury(&self) -> &TreasuryAllocator {
        &self.treasury
    }

    /// Ticks payable at `now`, capped at `max_ticks_per_call`.
    pub fn ticks_due(&self, last_reward_time: Timestamp, now: Timestamp) -> u64 {
        let elapsed = now.saturating_sub(last_reward_time);
        let ticks = elapsed / self.params.threshold_secs;
        if ticks > self.params.max_ticks_per_call {
            tracing::warn!(
                ticks,
                cap = self.params.max_ticks_per_call,
                "tick backlog exceeds per-call cap; remainder deferred"
            );
            return self.params.max_ticks_per_call;
        }
        ticks
    }

    fn reward_line(&self, payee: Address) -> Payment {
        Payment::new(payee, self.params.block_reward)
    }

    fn finish(
        &self,
        kind: DistributionKind,
        now: Timestamp,
        ticks: u64,
        mut payments: Vec<Payment>,
    ) -> Result<DistributionEvent> {
        if let Some(line) = self.treasury.line_for(ticks)? {
            payments.push(line);
        }
        Ok(DistributionEvent {
            kind,
            timestamp: now,
            ticks,
            payments,
        })
    }

    fn advance_time(&self, last_reward_time: Timestamp, ticks: u64) -> Result<Timestamp> {
        self.params
            .threshold_secs
            .checked_mul(ticks)
            .and_then(|span| last_reward_time.checked_add(span))
            .ok_or(RewardError::Overflow)
    }

    /// Refresh first, then rotate positionally over the refreshed list.
    fn distribute_every_call(
        &self,
        state: &mut SchedulerState,
        registry: &dyn ValidatorKeyRegistry,
        now: Timestamp,
    ) -> Result<DistributionEvent> {
        let mut cache = PayoutKeyCache::new(std::mem::take(&mut state.payout_keys));
        cache.refresh(registry)?;
        let len = cache.len() as u64;
        if len == 0 {
            return Err(RewardError::EmptyValidatorSet);
        }

        if !state.is_bootstrapped() {
            let payee = cache.at(0).ok_or(RewardError::EmptyValidatorSet)?;
            state.rotation_cursor = 1 % len;
            state.last_reward_time = now;
            state.payout_keys = cache.into_keys();
            return self.finish(DistributionKind::Bootstrap, now, 1, vec![self.reward_line(payee)]);
        }

        let ticks = self.ticks_due(state.last_reward_time, now);
        if ticks == 0 {
            return Ok(DistributionEvent::noop(now));
        }

        let start = state.rotation_cursor % len;
        let mut payments = Vec::with_capacity(payment_capacity(ticks));
        for i in 0..ticks {
            let payee = cache
                .at(start + i % len)
                .ok_or(RewardError::EmptyValidatorSet)?;
            payments.push(self.reward_line(payee));
        }

        state.last_reward_time = self.advance_time(state.last_reward_time, ticks)?;
        state.rotation_cursor = (start + ticks % len) % len;
        state.payout_keys = cache.into_keys();
        self.finish(DistributionKind::Steady, now, ticks, payments)
    }

    /// Rotate over the cached list, refreshing only at the end of a round.
    fn distribute_on_wrap(
        &self,
        state: &mut SchedulerState,
        registry: &dyn ValidatorKeyRegistry,
        now: Timestamp,
    ) -> Result<DistributionEvent> {
        let mut cache = PayoutKeyCache::new(std::mem::take(&mut state.payout_keys));
        let mut cursor = state.rotation_cursor;
        if !state.is_bootstrapped() {
            cursor = 0;
        }
        if cache.is_empty() || cursor >= cache.len() as u64 {
            cache.refresh(registry)?;
            cursor = 0;
        }
        if cache.is_empty() {
            return Err(RewardError::EmptyValidatorSet);
        }

        let (kind, ticks) = if state.is_bootstrapped() {
            (
                DistributionKind::Steady,
                self.ticks_due(state.last_reward_time, now),
            )
        } else {
            (DistributionKind::Bootstrap, 1)
        };
        if ticks == 0 {
            return Ok(DistributionEvent::noop(now));
        }

        let mut payments = Vec::with_capacity(payment_capacity(ticks));
        for _ in 0..ticks {
            let payee = cache.at(cursor).ok_or(RewardError::EmptyValidatorSet)?;
            payments.push(self.reward_line(payee));
            cursor += 1;
            if cursor >= cache.len() as u64 {
                cache.refresh(registry)?;
                if cache.is_empty() {
                    return Err(RewardError::EmptyValidatorSet);
                }
                cursor = 0;
            }
        }

        state.last_reward_time = match kind {
            DistributionKind::Bootstrap => now,
            DistributionKind::Steady => self.advance_time(state.last_reward_time, ticks)?,
        };
        state.rotation_cursor = cursor;
        state.payout_keys = cache.into_keys();
        self.finish(kind, now, ticks, payments)
    }
}

/// Room for one line per tick plus the treasury line.
fn payment_capacity(ticks: u64) -> usize {
    usize::try_from(ticks.min(MAX_TICKS_PER_CALL)).map_or(0, |t| t.saturating_add(1))
}

impl RewardLogic for RewardScheduler {
    fn implementation(&self) -> &str {
        &self.name
    }

    fn distribute(
        &self,
        state: &mut SchedulerState,
        registry: &dyn ValidatorKeyRegistry,
        now: Timestamp,
    ) -> Result<DistributionEvent> {
        if !state.is_bootstrapped() && now == 0 {
            return Err(RewardError::InvalidTimestamp(now));
        }

        // Work on a copy so a failure part-way leaves `state` as it was.
        let mut next = state.clone();
        let event = match self.params.refresh_policy {
            RefreshPolicy::EveryCall => self.distribute_every_call(&mut next, registry, now)?,
            RefreshPolicy::OnWrap => self.distribute_on_wrap(&mut next, registry, now)?,
        };

        if event.is_noop() {
            tracing::debug!(now, last_reward_time = state.last_reward_time, "no tick elapsed");
            return Ok(event);
        }

        *state = next;
        Ok(event)
    }
}
