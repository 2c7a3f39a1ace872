//! Core types and the ticket state machine for the helpdesk ledger.
//!
//! Nothing here touches HTTP or a database. [`TicketRegistry`] is a plain
//! value; [`store::TicketLedger`] is the seam storage backends implement.

pub mod address;
pub mod content;
pub mod error;
pub mod event;
pub mod registry;
pub mod role;
pub mod store;
pub mod ticket;

pub use address::Address;
pub use error::{Error, ErrorKind, Result};
pub use registry::TicketRegistry;
