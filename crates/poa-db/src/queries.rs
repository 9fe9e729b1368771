//! Database query functions organized by table group.

pub mod events;
pub mod proxy;
pub mod state;

use poa_types::{Address, Amount};

use crate::{DbError, Result};

/// SQLite integers are signed; reject values beyond `i64::MAX`.
pub(crate) fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| DbError::Serialization(format!("{value} exceeds i64")))
}

pub(crate) fn from_sql_int(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| DbError::Serialization(format!("negative integer {value}")))
}

pub(crate) fn parse_address(s: &str) -> Result<Address> {
    s.parse::<Address>()
        .map_err(|e| DbError::Serialization(format!("address '{s}': {e}")))
}

pub(crate) fn parse_amount(s: &str) -> Result<Amount> {
    s.parse::<Amount>()
        .map_err(|e| DbError::Serialization(format!("amount '{s}': {e}")))
}
