//! HTTP server assembly for the helpdesk ledger.
//!
//! Mounts the JSON API under `/api` and the content store under `/content`,
//! both behind Basic auth, with request tracing on every route.

pub mod auth;
pub mod content;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post},
};
use helpdesk_core::{Address, content::ContentStore, store::TicketLedger};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// One login: the address it acts as and its argon2 PHC password hash.
#[derive(Deserialize, Clone, Debug)]
pub struct Account {
  pub address:       Address,
  pub password_hash: String,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub ledger_path:       PathBuf,
  pub content_dir:       PathBuf,
  /// Seeds the manager role when the ledger file is created. Ignored
  /// afterwards unless it disagrees with the recorded one.
  pub bootstrap_manager: Option<Address>,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:  usize,
  #[serde(default)]
  pub accounts:          Vec<Account>,
}

fn default_max_upload_bytes() -> usize { 8 * 1024 * 1024 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the router.
#[derive(Clone)]
pub struct AppState<L: TicketLedger, C: ContentStore> {
  pub ledger:  Arc<L>,
  pub content: Arc<C>,
  pub config:  Arc<ServerConfig>,
  pub auth:    Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`].
pub fn router<L, C>(state: AppState<L, C>) -> Router
where
  L: TicketLedger + 'static,
  C: ContentStore + 'static,
{
  let content = Router::new()
    .route("/content", post(content::upload::<C>))
    .route("/content/{hash}", get(content::download::<C>))
    .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
    .with_state(state.content.clone());

  Router::new()
    .nest("/api", helpdesk_api::api_router(state.ledger.clone()))
    .merge(content)
    .layer(middleware::from_fn_with_state(state.auth.clone(), auth::authenticate))
    .route("/health", get(|| async { "ok" }))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
