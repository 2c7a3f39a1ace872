//! helpdesk-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), replays the
//! SQLite ledger, and serves the helpdesk API over HTTP.
//!
//! # Password hash generation
//!
//! Each `[[accounts]]` entry needs an argon2 PHC string:
//!
//! ```
//! cargo run -p helpdesk-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use helpdesk_server::{AppState, ServerConfig, auth::AuthConfig, content::FsContentStore};
use helpdesk_store_sqlite::SqliteLedger;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Helpdesk ticket ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HELPDESK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.accounts.is_empty() {
    tracing::warn!("no accounts configured; every request will be rejected");
  }

  let ledger_path = expand_tilde(&server_cfg.ledger_path);
  let ledger = SqliteLedger::open(&ledger_path, server_cfg.bootstrap_manager)
    .await
    .with_context(|| format!("failed to open ledger at {ledger_path:?}"))?;
  tracing::info!(
    genesis = %ledger.genesis_manager().await,
    head = ledger.head().await,
    "ledger ready"
  );

  let content_dir = expand_tilde(&server_cfg.content_dir);
  let content = FsContentStore::open(&content_dir)
    .await
    .with_context(|| format!("failed to open content store at {content_dir:?}"))?;

  let state = AppState {
    ledger:  Arc::new(ledger),
    content: Arc::new(content),
    auth:    Arc::new(AuthConfig::from_accounts(&server_cfg.accounts)),
    config:  Arc::new(server_cfg.clone()),
  };

  let app = helpdesk_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one line from stdin as the password.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
