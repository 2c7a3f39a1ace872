//! The `TicketLedger` trait.
//!
//! A ledger hosts one [`TicketRegistry`](crate::TicketRegistry): it puts every
//! submitted operation into a single global order, applies it atomically, and
//! records it durably. The trait is implemented by storage backends (e.g.
//! `helpdesk-store-sqlite`). Higher layers (`helpdesk-api`,
//! `helpdesk-server`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  address::Address,
  event::EventRecord,
  registry::{Operation, Receipt},
  role::Role,
  ticket::{Comment, Ticket},
};

/// Errors produced by a ledger backend.
pub trait LedgerError: std::error::Error + Send + Sync + 'static {
  /// The registry rejection behind this error, if the operation itself was
  /// refused rather than the backend failing.
  fn rejection(&self) -> Option<&crate::Error>;
}

/// Abstraction over a ledger backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TicketLedger: Send + Sync {
  type Error: LedgerError;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Apply `operation` on behalf of `caller` at the ledger's current time.
  ///
  /// Either the operation is recorded and its [`Receipt`] returned, or
  /// nothing changes. Dropping the returned future must not split the two:
  /// once persistence has started, the commit completes regardless.
  /// Submitting the same operation twice applies it twice.
  fn submit(
    &self,
    caller: Address,
    operation: Operation,
  ) -> impl Future<Output = Result<Receipt, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a ticket by id. Returns `None` if it was never created.
  fn ticket(&self, id: u64) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + '_;

  /// All tickets in id order.
  fn tickets(&self) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + '_;

  /// Comments on ticket `id` in insertion order, or `None` if the ticket
  /// does not exist.
  fn comments(
    &self,
    id: u64,
  ) -> impl Future<Output = Result<Option<Vec<Comment>>, Self::Error>> + Send + '_;

  fn role_of(&self, user: Address) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  fn managers(&self) -> impl Future<Output = Result<Vec<Address>, Self::Error>> + Send + '_;

  /// Up to `limit` events with a sequence number greater than `since`.
  fn events_since(
    &self,
    since: u64,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<EventRecord>, Self::Error>> + Send + '_;
}
