//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with full sub-second
//! precision, so a replayed transaction sees exactly the time it was first
//! applied at. Operations and events are stored as compact JSON. Addresses
//! are stored in their canonical lowercase form.

use chrono::{DateTime, Utc};
use helpdesk_core::{
  Address,
  event::Event,
  registry::{Operation, Transaction},
};

use crate::{Error, Result};

// ─── Address ─────────────────────────────────────────────────────────────────

pub fn encode_address(a: Address) -> String { a.to_string() }

pub fn decode_address(s: &str) -> Result<Address> {
  Address::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Operation / Event ───────────────────────────────────────────────────────

pub fn encode_operation(op: &Operation) -> Result<String> { Ok(serde_json::to_string(op)?) }

pub fn encode_event(event: &Event) -> Result<String> { Ok(serde_json::to_string(event)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from the `ledger_meta` row.
pub struct RawMeta {
  pub genesis_manager: String,
  pub created_at:      String,
}

impl RawMeta {
  pub fn decode(self) -> Result<(Address, DateTime<Utc>)> {
    Ok((decode_address(&self.genesis_manager)?, decode_dt(&self.created_at)?))
  }
}

/// Raw values read directly from a `transactions` row.
pub struct RawTransaction {
  pub seq:       i64,
  pub caller:    String,
  pub at:        String,
  pub operation: String,
  pub event:     String,
}

impl RawTransaction {
  /// Decode a row into the transaction it records and the event it emitted.
  pub fn decode(self) -> Result<(Transaction, Event)> {
    let seq = u64::try_from(self.seq)
      .map_err(|_| Error::Decode(format!("negative sequence number {}", self.seq)))?;
    let transaction = Transaction {
      seq,
      caller: decode_address(&self.caller)?,
      at: decode_dt(&self.at)?,
      operation: serde_json::from_str(&self.operation)?,
    };
    Ok((transaction, serde_json::from_str(&self.event)?))
  }
}
