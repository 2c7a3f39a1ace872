//! HTTP Basic-auth session layer.
//!
//! The username is the caller's address; the password is checked against the
//! argon2 hash configured for that address. On success the address is
//! attached to the request as a [`Caller`] for the API handlers.

use std::{collections::HashMap, sync::Arc};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use helpdesk_api::Caller;
use helpdesk_core::Address;

use crate::{Account, error::Error};

/// Credentials accepted as valid for this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  /// PHC strings produced by argon2, e.g. `$argon2id$v=19$…`, keyed by the
  /// address they unlock.
  pub accounts: HashMap<Address, String>,
}

impl AuthConfig {
  pub fn from_accounts(accounts: &[Account]) -> Self {
    Self {
      accounts: accounts
        .iter()
        .map(|a| (a.address, a.password_hash.clone()))
        .collect(),
    }
  }
}

/// Verify credentials from headers and return the authenticated address.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Address, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  let address = Address::parse(username).map_err(|_| Error::Unauthorized)?;

  let stored = config.accounts.get(&address).ok_or(Error::Unauthorized)?;
  let parsed_hash = PasswordHash::new(stored).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(address)
}

/// Middleware: reject unauthenticated requests, tag the rest with their
/// [`Caller`].
pub async fn authenticate(
  State(config): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let address = verify_auth(req.headers(), &config).inspect_err(|_| {
    tracing::warn!(path = %req.uri().path(), "rejected unauthenticated request");
  })?;
  req.extensions_mut().insert(Caller(address));
  Ok(next.run(req).await)
}
