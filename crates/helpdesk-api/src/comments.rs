//! Handlers for `/tickets/:id/comments`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tickets/:id/comments` | Insertion order; 404 if the ticket does not exist |
//! | `POST` | `/tickets/:id/comments` | Body: `{"content":"..."}`; returns 201 + stored comment |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use helpdesk_core::{
  registry::Operation,
  store::TicketLedger,
  ticket::Comment,
};
use serde::Deserialize;

use crate::{caller::Caller, error::ApiError};

/// `GET /tickets/:id/comments`
pub async fn list<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  _caller: Caller,
  Path(id): Path<u64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  let comments = ledger
    .comments(id)
    .await
    .map_err(ApiError::ledger)?
    .ok_or_else(|| ApiError::NotFound(format!("ticket {id} not found")))?;
  Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub content: String,
}

/// `POST /tickets/:id/comments`
pub async fn create<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(id): Path<u64>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let receipt = ledger
    .submit(caller, Operation::AddComment { id, content: body.content })
    .await
    .map_err(ApiError::ledger)?;
  let comment_id = receipt
    .created
    .ok_or_else(|| ApiError::Store(format!("commit {} created no comment", receipt.record.seq).into()))?;

  // Comments never change once appended, so reading after the commit is safe.
  let comment = ledger
    .comments(id)
    .await
    .map_err(ApiError::ledger)?
    .and_then(|comments| comments.into_iter().rev().find(|c| c.id == comment_id))
    .ok_or_else(|| ApiError::NotFound(format!("comment {comment_id} not found")))?;
  Ok((StatusCode::CREATED, Json(comment)))
}
