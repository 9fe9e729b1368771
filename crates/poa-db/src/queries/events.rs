//! Distribution event log.

use std::collections::BTreeMap;

use poa_types::{Address, Amount, DistributionEvent, DistributionKind, Payment};
use rusqlite::Connection;

use super::{from_sql_int, parse_address, parse_amount, to_sql_int};
use crate::{DbError, Result};

/// Append an event and its payment lines. Returns the event's sequence number.
pub fn append(conn: &Connection, event: &DistributionEvent) -> Result<i64> {
    conn.execute(
        "INSERT INTO distribution_events (kind, timestamp, ticks) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            event.kind.as_str(),
            to_sql_int(event.timestamp)?,
            to_sql_int(event.ticks)?,
        ],
    )?;
    let seq = conn.last_insert_rowid();

    let mut stmt = conn.prepare(
        "INSERT INTO distribution_payments (event_seq, line, payee, amount)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (line, payment) in event.payments.iter().enumerate() {
        stmt.execute(rusqlite::params![
            seq,
            line as i64,
            payment.payee.to_string(),
            payment.amount.to_string(),
        ])?;
    }
    Ok(seq)
}

/// All events, oldest first.
pub fn list(conn: &Connection) -> Result<Vec<DistributionEvent>> {
    let mut stmt = conn.prepare(
        "SELECT seq, kind, timestamp, ticks FROM distribution_events ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut payments = payments_by_event(conn)?;
    rows.into_iter()
        .map(|(seq, kind, timestamp, ticks)| -> Result<DistributionEvent> {
            let kind = DistributionKind::parse(&kind)
                .ok_or_else(|| DbError::Serialization(format!("event kind '{kind}'")))?;
            Ok(DistributionEvent {
                kind,
                timestamp: from_sql_int(timestamp)?,
                ticks: from_sql_int(ticks)?,
                payments: payments.remove(&seq).unwrap_or_default(),
            })
        })
        .collect()
}

/// Number of logged events.
pub fn count(conn: &Connection) -> Result<u64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM distribution_events", [], |row| row.get(0))?;
    from_sql_int(count)
}

/// Sum of all amounts ever paid to `payee`, treasury lines included.
pub fn total_paid(conn: &Connection, payee: &Address) -> Result<Amount> {
    let mut stmt = conn.prepare("SELECT amount FROM distribution_payments WHERE payee = ?1")?;
    let amounts = stmt
        .query_map([payee.to_string()], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    amounts.iter().try_fold(0, |total: Amount, s| -> Result<Amount> {
        total
            .checked_add(parse_amount(s)?)
            .ok_or_else(|| DbError::Serialization(format!("total paid to {payee} overflows")))
    })
}

fn payments_by_event(conn: &Connection) -> Result<BTreeMap<i64, Vec<Payment>>> {
    let mut stmt = conn.prepare(
        "SELECT event_seq, payee, amount FROM distribution_payments ORDER BY event_seq, line",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut grouped: BTreeMap<i64, Vec<Payment>> = BTreeMap::new();
    for (seq, payee, amount) in rows {
        grouped
            .entry(seq)
            .or_default()
            .push(Payment::new(parse_address(&payee)?, parse_amount(&amount)?));
    }
    Ok(grouped)
}
