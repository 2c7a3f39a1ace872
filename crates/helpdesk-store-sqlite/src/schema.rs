//! SQL schema for the helpdesk SQLite ledger.
//!
//! Applied with `execute_batch` every time a ledger is opened. Every statement
//! is idempotent, so reopening an existing file leaves it untouched. The
//! batch stamps `user_version = 1` but nothing reads it back yet.

/// Full schema DDL, safe to run against an existing ledger.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Exactly one row, written when the ledger is first opened.
CREATE TABLE IF NOT EXISTS ledger_meta (
    id              INTEGER PRIMARY KEY CHECK (id = 1),
    genesis_manager TEXT NOT NULL,   -- 0x-prefixed lowercase address
    created_at      TEXT NOT NULL    -- ISO 8601 UTC
);

-- The transaction log is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS transactions (
    seq       INTEGER PRIMARY KEY,   -- 1-based, gap-free
    caller    TEXT NOT NULL,
    at        TEXT NOT NULL,         -- ISO 8601 UTC; clamped ledger time
    operation TEXT NOT NULL,         -- JSON-encoded Operation
    event     TEXT NOT NULL          -- JSON-encoded Event
);

PRAGMA user_version = 1;
";
