//! Handler for `GET /events`.
//!
//! Clients poll with the last sequence number they have seen and get the
//! events committed after it, oldest first.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use helpdesk_core::{event::EventRecord, store::TicketLedger};
use serde::Deserialize;

use crate::{caller::Caller, error::ApiError};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize, Default)]
pub struct EventParams {
  /// Return events with a sequence number greater than this. Default 0.
  #[serde(default)]
  pub since: u64,
  pub limit: Option<usize>,
}

/// `GET /events[?since=<seq>][&limit=<n>]`
pub async fn list<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  _caller: Caller,
  Query(params): Query<EventParams>,
) -> Result<Json<Vec<EventRecord>>, ApiError> {
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
  let events = ledger
    .events_since(params.since, limit)
    .await
    .map_err(ApiError::ledger)?;
  Ok(Json(events))
}
