//! Error type for `helpdesk-store-sqlite`.

use helpdesk_core::{Address, store::LedgerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The registry refused the operation; nothing was recorded.
  #[error(transparent)]
  Rejected(#[from] helpdesk_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("ledger task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("cannot decode stored value: {0}")]
  Decode(String),

  #[error("ledger has no genesis record and no bootstrap manager was given")]
  MissingGenesis,

  #[error("ledger was created by {stored}, not {requested}")]
  GenesisMismatch {
    stored:    Address,
    requested: Address,
  },

  /// A recorded transaction no longer applies cleanly.
  #[error("replay failed at transaction {seq}: {source}")]
  Replay {
    seq:    u64,
    source: helpdesk_core::Error,
  },

  #[error("replayed transaction {0} does not match its recorded event")]
  Divergence(u64),
}

impl LedgerError for Error {
  fn rejection(&self) -> Option<&helpdesk_core::Error> {
    match self {
      Self::Rejected(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
