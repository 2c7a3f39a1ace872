//! Handlers for role management and caller identity.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Caller address and role |
//! | `GET`  | `/managers` | Every address holding the manager role |
//! | `GET`  | `/roles/:address` | Unassigned addresses report `user` |
//! | `PUT`  | `/roles/:address` | Body: `{"role":"manager"}`; manager only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use helpdesk_core::{Address, registry::Operation, role::Role, store::TicketLedger};
use serde::{Deserialize, Serialize};

use crate::{caller::Caller, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleView {
  pub address: Address,
  pub role:    Role,
}

/// `GET /me`
pub async fn me<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
) -> Result<Json<RoleView>, ApiError> {
  let role = ledger.role_of(caller).await.map_err(ApiError::ledger)?;
  Ok(Json(RoleView { address: caller, role }))
}

/// `GET /managers`
pub async fn managers<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  _caller: Caller,
) -> Result<Json<Vec<Address>>, ApiError> {
  Ok(Json(ledger.managers().await.map_err(ApiError::ledger)?))
}

/// `GET /roles/:address`
pub async fn get_one<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  _caller: Caller,
  Path(address): Path<Address>,
) -> Result<Json<RoleView>, ApiError> {
  let role = ledger.role_of(address).await.map_err(ApiError::ledger)?;
  Ok(Json(RoleView { address, role }))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `PUT /roles/:address`
pub async fn set<L: TicketLedger>(
  State(ledger): State<Arc<L>>,
  Caller(caller): Caller,
  Path(address): Path<Address>,
  Json(body): Json<RoleBody>,
) -> Result<Json<RoleView>, ApiError> {
  ledger
    .submit(caller, Operation::SetUserRole { user: address, role: body.role })
    .await
    .map_err(ApiError::ledger)?;
  Ok(Json(RoleView { address, role: body.role }))
}
