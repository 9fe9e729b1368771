//! Database migration system.
//!
//! Schema version stored in `PRAGMA user_version`. Only v1 exists: an empty
//! database is initialized, a v1 database is left alone, and anything newer is
//! refused.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Bring the database to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DbError::Sqlite)?;

    if current_version == 0 {
        tracing::info!("Initializing database schema v{SCHEMA_VERSION}");
        conn.execute_batch(schema::SCHEMA_V1)
            .map_err(DbError::Sqlite)?;

        insert_initial_state(conn)?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(DbError::Sqlite)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "Database version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

/// Seed the singleton state row: not yet bootstrapped.
fn insert_initial_state(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO scheduler_state (id, last_reward_time, rotation_cursor)
         VALUES (1, 0, 0)",
        [],
    )
    .map_err(DbError::Sqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");
        conn
    }

    #[test]
    fn test_fresh_migration() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = fresh();
        run(&conn).expect("first run");
        run(&conn).expect("second run should be no-op");
    }

    #[test]
    fn test_rerun_keeps_existing_rows() {
        let conn = fresh();
        run(&conn).expect("first run");
        conn.execute(
            "UPDATE scheduler_state SET last_reward_time = 150, rotation_cursor = 2 WHERE id = 1",
            [],
        )
        .expect("update state");

        run(&conn).expect("second run");

        let (last, cursor): (i64, i64) = conn
            .query_row(
                "SELECT last_reward_time, rotation_cursor FROM scheduler_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("query");
        assert_eq!((last, cursor), (150, 2));
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_version_rejected() {
        let conn = fresh();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .expect("set version");
        assert!(matches!(run(&conn), Err(DbError::Migration(_))));
    }

    #[test]
    fn test_initial_state_row() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let (last, cursor): (i64, i64) = conn
            .query_row(
                "SELECT last_reward_time, rotation_cursor FROM scheduler_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("query");
        assert_eq!((last, cursor), (0, 0));
    }

    #[test]
    fn test_tables_created() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let expected_tables = [
            "scheduler_state",
            "payout_keys",
            "distribution_events",
            "distribution_payments",
            "proxy",
        ];

        for table in &expected_tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .expect("table check");
            assert_eq!(count, 1, "Table '{table}' should exist");
        }
    }
}
