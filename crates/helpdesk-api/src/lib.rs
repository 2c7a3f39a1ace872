//! JSON REST API for the helpdesk ledger.
//!
//! Exposes an axum [`Router`] backed by any
//! [`helpdesk_core::store::TicketLedger`]. Authentication, TLS, and transport
//! concerns are the caller's responsibility: every route expects a
//! [`Caller`] in the request extensions and answers 401 without one.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", helpdesk_api::api_router(ledger.clone()))
//! ```

pub mod caller;
pub mod comments;
pub mod error;
pub mod events;
pub mod roles;
pub mod tickets;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use helpdesk_core::store::TicketLedger;

pub use caller::Caller;
pub use error::ApiError;

/// Build a fully-materialised API router for `ledger`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<L>(ledger: Arc<L>) -> Router<()>
where
  L: TicketLedger + 'static,
{
  Router::new()
    // Tickets
    .route("/tickets", get(tickets::list::<L>).post(tickets::create::<L>))
    .route("/tickets/{id}", get(tickets::get_one::<L>))
    .route("/tickets/{id}/status", post(tickets::update_status::<L>))
    .route("/tickets/{id}/assign", post(tickets::assign::<L>))
    .route("/tickets/{id}/resolve", post(tickets::resolve::<L>))
    .route("/tickets/{id}/close", post(tickets::close::<L>))
    .route("/tickets/{id}/reopen", post(tickets::reopen::<L>))
    // Comments
    .route(
      "/tickets/{id}/comments",
      get(comments::list::<L>).post(comments::create::<L>),
    )
    // Roles
    .route("/me", get(roles::me::<L>))
    .route("/managers", get(roles::managers::<L>))
    .route("/roles/{address}", get(roles::get_one::<L>).put(roles::set::<L>))
    // Events
    .route("/events", get(events::list::<L>))
    .with_state(ledger)
}

// ─── Integration tests ────────────────────────────────────────────────────────
