//! Handlers for `/tickets` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tickets` | Optional `?status`, `?assignee`, `?creator` filters |
//! | `POST` | `/tickets` | Body: [`NewTicket`]; returns 201 + stored ticket |
//! | `GET`  | `/tickets/:id` | Ticket with its comments |
//! | `POST` | `/tickets/:id/status` | Body: `{"status":"closed"}` |
//! | `POST` | `/tickets/:id/assign` | Body: `{"assignee":"0x…"}` |
//! | `POST` | `/tickets/:id/resolve` | Manager only |
//! | `POST` | `/tickets/:id/close` | Manager only |
//! | `POST` | `/tickets/:id/reopen` | Manager only; resolved or closed tickets |
//!
//! Every mutation answers with the ticket as it stands after the commit.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use helpdesk_core::{
  Address,
  registry::{Operation, Receipt},
  store::TicketLedger,
  ticket::{Comment, NewTicket, Status, Ticket},
};
use serde::{Deserialize, Serialize};

use crate::{caller::Caller, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:   Option<Status>,
  pub assignee: Option<Address>,
  pub creator:  Option<Address>,
}

/// `GET /tickets[?status=...][&assignee=...][&creator=...]`
pub async fn list<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  _caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
  let mut tickets = ledger.tickets().await.map_err(ApiError::ledger)?;
  tickets.retain(|t| {
    params.status.is_none_or(|s| t.status == s)
      && params.assignee.is_none_or(|a| t.assignee == Some(a))
      && params.creator.is_none_or(|c| t.creator == c)
  });
  Ok(Json(tickets))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /tickets`: returns 201 + the stored [`Ticket`].
pub async fn create<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Json(body): Json<NewTicket>,
) -> Result<impl IntoResponse, ApiError> {
  let receipt = ledger
    .submit(caller, Operation::CreateTicket(body))
    .await
    .map_err(ApiError::ledger)?;
  Ok((StatusCode::CREATED, Json(committed(receipt)?)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// A ticket together with its comment thread.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketDetail {
  #[serde(flatten)]
  pub ticket:   Ticket,
  pub comments: Vec<Comment>,
}

/// `GET /tickets/:id`
pub async fn get_one<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  _caller: Caller,
  Path(id): Path<u64>,
) -> Result<Json<TicketDetail>, ApiError> {
  let ticket = fetch(&*ledger, id).await?;
  let comments = ledger
    .comments(id)
    .await
    .map_err(ApiError::ledger)?
    .unwrap_or_default();
  Ok(Json(TicketDetail { ticket, comments }))
}

// ─── Transitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: Status,
}

/// `POST /tickets/:id/status`: allowed for the creator, the assignee and managers.
pub async fn update_status<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(id): Path<u64>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Ticket>, ApiError> {
  apply(&*ledger, caller, Operation::UpdateStatus { id, status: body.status }).await
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub assignee: Address,
}

/// `POST /tickets/:id/assign`: the assignee must hold the manager role.
pub async fn assign<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(id): Path<u64>,
  Json(body): Json<AssignBody>,
) -> Result<Json<Ticket>, ApiError> {
  apply(&*ledger, caller, Operation::Assign { id, assignee: body.assignee }).await
}

/// `POST /tickets/:id/resolve`
pub async fn resolve<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(id): Path<u64>,
) -> Result<Json<Ticket>, ApiError> {
  apply(&*ledger, caller, Operation::Resolve { id }).await
}

/// `POST /tickets/:id/close`
pub async fn close<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(id): Path<u64>,
) -> Result<Json<Ticket>, ApiError> {
  apply(&*ledger, caller, Operation::Close { id }).await
}

/// `POST /tickets/:id/reopen`
pub async fn reopen<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(id): Path<u64>,
) -> Result<Json<Ticket>, ApiError> {
  apply(&*ledger, caller, Operation::Reopen { id }).await
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn apply<L: TicketLedger>(
  ledger: &L,
  caller: Address,
  operation: Operation,
) -> Result<Json<Ticket>, ApiError> {
  let receipt = ledger.submit(caller, operation).await.map_err(ApiError::ledger)?;
  committed(receipt).map(Json)
}

/// The ticket exactly as this caller's operation left it, even if another
/// write has landed since.
fn committed(receipt: Receipt) -> Result<Ticket, ApiError> {
  receipt
    .ticket
    .ok_or_else(|| ApiError::Store(format!("commit {} touched no ticket", receipt.record.seq).into()))
}

pub(crate) async fn fetch<L: TicketLedger>(ledger: &L, id: u64) -> Result<Ticket, ApiError> {
  ledger
    .ticket(id)
    .await
    .map_err(ApiError::ledger)?
    .ok_or_else(|| ApiError::NotFound(format!("ticket {id} not found")))
}
