//! `helpdesk`: command-line client for the helpdesk ticket ledger.
//!
//! # Usage
//!
//! ```
//! helpdesk --url http://localhost:8545 --address 0xa1… --password secret list
//! helpdesk --config ~/.config/helpdesk/config.toml create --title "Printer jam" \
//!   --description-file jam.json --attach photo.jpg
//! ```

mod client;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use helpdesk_core::{
  Address,
  content::ContentHash,
  role::Role,
  ticket::{NewTicket, Status},
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "helpdesk", about = "Command-line client for the helpdesk ledger")]
struct Args {
  /// Path to a TOML config file (url, address, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the helpdesk server (default: http://localhost:8545).
  #[arg(long, env = "HELPDESK_URL")]
  url: Option<String>,

  /// Address to authenticate as.
  #[arg(long, env = "HELPDESK_ADDRESS")]
  address: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "HELPDESK_PASSWORD")]
  password: Option<String>,

  /// Print raw JSON responses instead of text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List tickets.
  List {
    #[arg(long)]
    status: Option<Status>,
  },
  /// Show one ticket and its comments.
  Show { id: u64 },
  /// Open a new ticket.
  Create {
    #[arg(long)]
    title:            String,
    /// Reference to an already-stored description.
    #[arg(long, conflicts_with = "description_file", required_unless_present = "description_file")]
    description:      Option<String>,
    /// Upload this file and use its hash as the description.
    #[arg(long, value_name = "FILE")]
    description_file: Option<PathBuf>,
    /// Upload this file and attach its hash.
    #[arg(long, value_name = "FILE")]
    attach:           Option<PathBuf>,
  },
  /// Set a ticket's status.
  Status { id: u64, status: Status },
  /// Assign a ticket to a manager.
  Assign { id: u64, assignee: Address },
  /// Mark a ticket resolved.
  Resolve { id: u64 },
  /// Close a ticket.
  Close { id: u64 },
  /// Reopen a resolved or closed ticket.
  Reopen { id: u64 },
  /// Add a comment to a ticket.
  Comment { id: u64, text: String },
  /// Show an address's role, or set it when ROLE is given.
  Role { address: Address, role: Option<Role> },
  /// List every manager.
  Managers,
  /// Show the authenticated address and its role.
  Whoami,
  /// Print the event log.
  Events {
    #[arg(long, default_value_t = 0)]
    since: u64,
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Download a stored blob.
  Fetch {
    hash: ContentHash,
    /// Write to this file instead of stdout.
    #[arg(long, value_name = "FILE")]
    out:  Option<PathBuf>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  address:  String,
  #[serde(default)]
  password: String,
}

const DEFAULT_URL: &str = "http://localhost:8545";

/// Flags (and their env vars) override the config file, which overrides
/// defaults.
fn resolve_config(
  url: Option<String>,
  address: Option<String>,
  password: Option<String>,
  file: ConfigFile,
) -> ApiConfig {
  let pick = |flag: Option<String>, file: String| flag.or_else(|| (!file.is_empty()).then_some(file));
  ApiConfig {
    base_url: pick(url, file.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
    address:  pick(address, file.address).unwrap_or_default(),
    password: pick(password, file.password).unwrap_or_default(),
  }
}

fn load_config_file(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = load_config_file(args.config.as_deref())?;
  let api_config = resolve_config(args.url, args.address, args.password, file_cfg);
  tracing::debug!(url = %api_config.base_url, address = %api_config.address, "connecting");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command, args.json).await
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(value)?);
  } else {
    print!("{}", text(value));
  }
  Ok(())
}

async fn upload_file(client: &ApiClient, path: &Path) -> Result<ContentHash> {
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("reading {}", path.display()))?;
  let uploaded = client.upload(bytes).await?;
  tracing::info!(file = %path.display(), hash = %uploaded.hash, size = uploaded.size, "uploaded");
  Ok(uploaded.hash)
}

async fn run(client: &ApiClient, command: Command, json: bool) -> Result<()> {
  match command {
    Command::List { status } => {
      let tickets = client.list_tickets(status).await?;
      print(json, &tickets, |t| output::ticket_table(t))
    }
    Command::Show { id } => {
      let detail = client.get_ticket(id).await?;
      print(json, &detail, output::ticket_detail)
    }
    Command::Create { title, description, description_file, attach } => {
      let description = match (description, description_file) {
        (_, Some(path)) => upload_file(client, &path).await?.to_string(),
        (Some(reference), None) => reference,
        (None, None) => anyhow::bail!("--description or --description-file is required"),
      };
      let mut new = NewTicket::new(title, description);
      if let Some(path) = attach {
        new = new.with_attachment(upload_file(client, &path).await?.to_string());
      }
      let ticket = client.create_ticket(&new).await?;
      print(json, &ticket, output::ticket)
    }
    Command::Status { id, status } => {
      let ticket = client.update_status(id, status).await?;
      print(json, &ticket, output::ticket)
    }
    Command::Assign { id, assignee } => {
      let ticket = client.assign(id, assignee).await?;
      print(json, &ticket, output::ticket)
    }
    Command::Resolve { id } => {
      print(json, &client.transition(id, "resolve").await?, output::ticket)
    }
    Command::Close { id } => print(json, &client.transition(id, "close").await?, output::ticket),
    Command::Reopen { id } => {
      print(json, &client.transition(id, "reopen").await?, output::ticket)
    }
    Command::Comment { id, text } => {
      let comment = client.add_comment(id, &text).await?;
      print(json, &comment, output::comment)
    }
    Command::Role { address, role: None } => {
      print(json, &client.role_of(address).await?, output::role)
    }
    Command::Role { address, role: Some(role) } => {
      print(json, &client.set_role(address, role).await?, output::role)
    }
    Command::Managers => {
      let managers = client.managers().await?;
      print(json, &managers, |m| m.iter().map(|a| format!("{a}\n")).collect())
    }
    Command::Whoami => print(json, &client.whoami().await?, output::role),
    Command::Events { since, limit } => {
      let events = client.events(since, limit).await?;
      print(json, &events, |e| e.iter().map(output::event).collect())
    }
    Command::Fetch { hash, out } => {
      let bytes = client.download(&hash).await?;
      match out {
        Some(path) => tokio::fs::write(&path, &bytes)
          .await
          .with_context(|| format!("writing {}", path.display())),
        None => {
          use std::io::Write as _;
          std::io::stdout().write_all(&bytes).context("writing to stdout")
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_override_file_which_overrides_defaults() {
    let file = ConfigFile {
      url:      "http://desk.example:9000".to_string(),
      address:  "0xfile".to_string(),
      password: "from-file".to_string(),
    };
    let cfg = resolve_config(None, Some("0xflag".to_string()), None, file);
    assert_eq!(cfg.base_url, "http://desk.example:9000");
    assert_eq!(cfg.address, "0xflag");
    assert_eq!(cfg.password, "from-file");
  }

  #[test]
  fn empty_file_values_fall_back_to_defaults() {
    let cfg = resolve_config(None, None, None, ConfigFile::default());
    assert_eq!(cfg.base_url, DEFAULT_URL);
    assert!(cfg.address.is_empty());
  }

  #[test]
  fn config_file_parses_partial_toml() {
    let cfg: ConfigFile = toml::from_str("url = \"http://h:1\"\n").unwrap();
    assert_eq!(cfg.url, "http://h:1");
    assert!(cfg.password.is_empty());
  }

  #[test]
  fn create_requires_a_description() {
    let parsed = Args::try_parse_from(["helpdesk", "create", "--title", "Printer jam"]);
    assert!(parsed.is_err());

    let parsed = Args::try_parse_from([
      "helpdesk",
      "create",
      "--title",
      "Printer jam",
      "--description",
      "bafy-desc",
    ])
    .unwrap();
    assert!(matches!(parsed.command, Command::Create { description: Some(_), .. }));
  }

  #[test]
  fn role_parses_address_and_optional_role() {
    let addr = Address::from_bytes([0xa1; 20]).to_string();
    let parsed = Args::try_parse_from(["helpdesk", "role", &addr, "manager"]).unwrap();
    assert!(matches!(parsed.command, Command::Role { role: Some(Role::Manager), .. }));

    let parsed = Args::try_parse_from(["helpdesk", "status", "3", "in_progress"]).unwrap();
    assert!(matches!(parsed.command, Command::Status { id: 3, status: Status::InProgress }));
  }
}
