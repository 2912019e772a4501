//! SQL schema for the Pulse SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Phone is deliberately not UNIQUE: lookups return the earliest match.
CREATE TABLE IF NOT EXISTS subscribers (
    subscriber_id TEXT PRIMARY KEY,
    phone         TEXT NOT NULL,      -- canonical digits, no '+'
    display_name  TEXT NOT NULL,
    frequency     TEXT NOT NULL DEFAULT 'weekly',
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,      -- RFC 3339 UTC; server-assigned
    last_sent_at  TEXT                -- RFC 3339 UTC or NULL
);

-- One row per subscriber; every generation overwrites it.
CREATE TABLE IF NOT EXISTS snapshots (
    subscriber_id TEXT PRIMARY KEY REFERENCES subscribers(subscriber_id),
    generated_at  TEXT NOT NULL,
    data_json     TEXT NOT NULL       -- JSON object of metric values
);

CREATE INDEX IF NOT EXISTS subscribers_phone_idx  ON subscribers(phone);
CREATE INDEX IF NOT EXISTS subscribers_active_idx ON subscribers(active);

PRAGMA user_version = 1;
";
