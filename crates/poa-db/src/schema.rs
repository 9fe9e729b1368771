//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Rotation state
-- ============================================================

CREATE TABLE IF NOT EXISTS scheduler_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_reward_time INTEGER NOT NULL,
    rotation_cursor INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS payout_keys (
    position INTEGER PRIMARY KEY,
    address TEXT NOT NULL UNIQUE
);

-- ============================================================
-- Distribution log
-- ============================================================

CREATE TABLE IF NOT EXISTS distribution_events (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK (kind IN ('bootstrap', 'steady')),
    timestamp INTEGER NOT NULL,
    ticks INTEGER NOT NULL CHECK (ticks > 0)
);

CREATE TABLE IF NOT EXISTS distribution_payments (
    event_seq INTEGER NOT NULL REFERENCES distribution_events(seq) ON DELETE CASCADE,
    line INTEGER NOT NULL,
    payee TEXT NOT NULL,
    amount TEXT NOT NULL,
    PRIMARY KEY (event_seq, line)
);

CREATE INDEX IF NOT EXISTS idx_payments_payee ON distribution_payments(payee);

-- ============================================================
-- Upgrade proxy
-- ============================================================

CREATE TABLE IF NOT EXISTS proxy (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    implementation TEXT NOT NULL,
    version INTEGER NOT NULL,
    proxy_storage TEXT NOT NULL
);
"#;
