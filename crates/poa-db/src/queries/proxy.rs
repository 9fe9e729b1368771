//! Upgrade proxy record.

use poa_types::ProxyRecord;
use rusqlite::{Connection, OptionalExtension};

use super::{from_sql_int, parse_address, to_sql_int};
use crate::Result;

/// The proxy record, if the database has been bound to an implementation.
pub fn load(conn: &Connection) -> Result<Option<ProxyRecord>> {
    let row = conn
        .query_row(
            "SELECT implementation, version, proxy_storage FROM proxy WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(implementation, version, proxy_storage)| -> Result<ProxyRecord> {
        Ok(ProxyRecord {
            implementation,
            version: from_sql_int(version)?,
            proxy_storage: parse_address(&proxy_storage)?,
        })
    })
    .transpose()
}

/// Insert or replace the proxy record.
pub fn save(conn: &Connection, record: &ProxyRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO proxy (id, implementation, version, proxy_storage)
         VALUES (1, ?1, ?2, ?3)",
        rusqlite::params![
            record.implementation,
            to_sql_int(record.version)?,
            record.proxy_storage.to_string(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poa_types::Address;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_absent_by_default() {
        let conn = test_db();
        assert!(load(&conn).expect("load").is_none());
    }

    #[test]
    fn test_save_and_replace() {
        let conn = test_db();
        let mut record = ProxyRecord::new("reward-by-time", Address::from_low_u64(8));
        save(&conn, &record).expect("save");
        assert_eq!(load(&conn).expect("load"), Some(record.clone()));

        record.implementation = "reward-by-time-v2".into();
        record.version = 2;
        save(&conn, &record).expect("replace");
        assert_eq!(load(&conn).expect("load"), Some(record));
    }
}
