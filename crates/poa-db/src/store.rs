//! [`StateStore`] backed by the SQLite database.

use std::path::Path;

use poa_rewards::StateStore;
use poa_types::{DistributionEvent, ProxyRecord, SchedulerState};
use rusqlite::Connection;

use crate::queries::{events, proxy, state};

/// Durable scheduler state. Each commit is one SQLite transaction.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> crate::Result<Self> {
        Ok(Self {
            conn: crate::open(path)?,
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> crate::Result<Self> {
        Ok(Self {
            conn: crate::open_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StateStore for SqliteStore {
    fn load_state(&self) -> poa_rewards::Result<SchedulerState> {
        Ok(state::load(&self.conn)?)
    }

    fn commit(
        &mut self,
        next: &SchedulerState,
        event: &DistributionEvent,
    ) -> poa_rewards::Result<()> {
        let tx = self.conn.transaction().map_err(crate::DbError::Sqlite)?;
        state::save(&tx, next)?;
        let seq = events::append(&tx, event)?;
        tx.commit().map_err(crate::DbError::Sqlite)?;
        tracing::debug!(seq, ticks = event.ticks, "distribution committed");
        Ok(())
    }

    fn load_proxy(&self) -> poa_rewards::Result<Option<ProxyRecord>> {
        Ok(proxy::load(&self.conn)?)
    }

    fn save_proxy(&mut self, record: &ProxyRecord) -> poa_rewards::Result<()> {
        Ok(proxy::save(&self.conn, record)?)
    }

    fn events(&self) -> poa_rewards::Result<Vec<DistributionEvent>> {
        Ok(events::list(&self.conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poa_types::{Address, DistributionKind, Payment};

    fn bootstrap_event() -> DistributionEvent {
        DistributionEvent {
            kind: DistributionKind::Bootstrap,
            timestamp: 100,
            ticks: 1,
            payments: vec![
                Payment::new(Address::from_low_u64(1), 10),
                Payment::new(Address::ZERO, 10),
            ],
        }
    }

    fn bootstrapped_state() -> SchedulerState {
        SchedulerState {
            last_reward_time: 100,
            rotation_cursor: 1,
            payout_keys: vec![Address::from_low_u64(1), Address::from_low_u64(2)],
        }
    }

    #[test]
    fn test_commit_and_load() {
        let mut store = SqliteStore::open_memory().expect("open");
        store
            .commit(&bootstrapped_state(), &bootstrap_event())
            .expect("commit");
        assert_eq!(store.load_state().expect("state"), bootstrapped_state());
        assert_eq!(store.events().expect("events"), vec![bootstrap_event()]);
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let mut store = SqliteStore::open_memory().expect("open");
        store
            .commit(&bootstrapped_state(), &bootstrap_event())
            .expect("commit");

        // Duplicate payout keys violate the UNIQUE constraint after the
        // state row has already been updated inside the transaction.
        let bad = SchedulerState {
            last_reward_time: 105,
            rotation_cursor: 0,
            payout_keys: vec![Address::from_low_u64(3), Address::from_low_u64(3)],
        };
        let mut event = bootstrap_event();
        event.kind = DistributionKind::Steady;
        event.timestamp = 105;

        let result = store.commit(&bad, &event);
        assert!(matches!(result, Err(poa_rewards::RewardError::Store(_))));
        assert_eq!(store.load_state().expect("state"), bootstrapped_state());
        assert_eq!(store.events().expect("events").len(), 1);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(crate::DB_FILE_NAME);
        {
            let mut store = SqliteStore::open(&path).expect("open");
            store
                .commit(&bootstrapped_state(), &bootstrap_event())
                .expect("commit");
            store
                .save_proxy(&ProxyRecord::new("reward-by-time", Address::from_low_u64(8)))
                .expect("save proxy");
        }

        let store = SqliteStore::open(&path).expect("reopen");
        assert_eq!(store.load_state().expect("state"), bootstrapped_state());
        assert_eq!(
            store.load_proxy().expect("proxy").map(|r| r.implementation),
            Some("reward-by-time".to_string())
        );
    }
}
