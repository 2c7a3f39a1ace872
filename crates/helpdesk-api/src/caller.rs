//! The authenticated caller of a request.
//!
//! This crate does not authenticate anyone. An outer layer (the server's
//! auth middleware, or a test) inserts a [`Caller`] into the request
//! extensions; handlers extract it and pass its address to the ledger.

use axum::{extract::FromRequestParts, http::request::Parts};
use helpdesk_core::Address;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Address);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts.extensions.get::<Caller>().copied().ok_or(ApiError::Unauthenticated)
  }
}
