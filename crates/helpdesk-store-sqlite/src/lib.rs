//! SQLite backend for the helpdesk ledger.
//!
//! The database holds the append-only transaction log; the live
//! [`TicketRegistry`](helpdesk_core::TicketRegistry) is rebuilt from it on
//! open. Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteLedger;

#[cfg(test)]
mod tests;
