//! Scheduler state and payout key list.

use poa_types::{Address, SchedulerState};
use rusqlite::Connection;

use super::{from_sql_int, parse_address, to_sql_int};
use crate::{DbError, Result};

/// Load the scheduler state, including the payout key list in position order.
pub fn load(conn: &Connection) -> Result<SchedulerState> {
    let (last_reward_time, rotation_cursor): (i64, i64) = conn
        .query_row(
            "SELECT last_reward_time, rotation_cursor FROM scheduler_state WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("scheduler state".into()),
            other => DbError::Sqlite(other),
        })?;

    Ok(SchedulerState {
        last_reward_time: from_sql_int(last_reward_time)?,
        rotation_cursor: from_sql_int(rotation_cursor)?,
        payout_keys: payout_keys(conn)?,
    })
}

/// The persisted payout key list in position order.
pub fn payout_keys(conn: &Connection) -> Result<Vec<Address>> {
    let mut stmt = conn.prepare("SELECT address FROM payout_keys ORDER BY position")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter().map(|s| parse_address(s)).collect()
}

/// Overwrite the scheduler state and payout key list.
///
/// Callers wanting atomicity with other writes pass a transaction.
pub fn save(conn: &Connection, state: &SchedulerState) -> Result<()> {
    conn.execute(
        "UPDATE scheduler_state SET last_reward_time = ?1, rotation_cursor = ?2 WHERE id = 1",
        rusqlite::params![
            to_sql_int(state.last_reward_time)?,
            to_sql_int(state.rotation_cursor)?,
        ],
    )?;

    conn.execute("DELETE FROM payout_keys", [])?;
    let mut stmt = conn.prepare("INSERT INTO payout_keys (position, address) VALUES (?1, ?2)")?;
    for (position, address) in state.payout_keys.iter().enumerate() {
        stmt.execute(rusqlite::params![position as i64, address.to_string()])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_fresh_state() {
        let conn = test_db();
        let state = load(&conn).expect("load");
        assert_eq!(state, SchedulerState::default());
    }

    #[test]
    fn test_save_and_load() {
        let conn = test_db();
        let state = SchedulerState {
            last_reward_time: 1_700_000_000,
            rotation_cursor: 2,
            payout_keys: vec![
                Address::from_low_u64(3),
                Address::from_low_u64(1),
                Address::from_low_u64(2),
            ],
        };
        save(&conn, &state).expect("save");
        assert_eq!(load(&conn).expect("load"), state);
    }

    #[test]
    fn test_save_replaces_key_list() {
        let conn = test_db();
        let mut state = SchedulerState {
            last_reward_time: 100,
            rotation_cursor: 0,
            payout_keys: vec![Address::from_low_u64(1), Address::from_low_u64(2)],
        };
        save(&conn, &state).expect("save");

        state.payout_keys = vec![Address::from_low_u64(2)];
        save(&conn, &state).expect("save again");
        assert_eq!(payout_keys(&conn).expect("keys"), state.payout_keys);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let conn = test_db();
        let state = SchedulerState {
            last_reward_time: 100,
            rotation_cursor: 0,
            payout_keys: vec![Address::from_low_u64(1), Address::from_low_u64(1)],
        };
        assert!(save(&conn, &state).is_err());
    }

    #[test]
    fn test_missing_row_not_found() {
        let conn = test_db();
        conn.execute("DELETE FROM scheduler_state", []).expect("delete");
        assert!(matches!(load(&conn), Err(DbError::NotFound(_))));
    }
}
