//! Async HTTP client wrapping the helpdesk JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use helpdesk_core::{
  Address,
  content::ContentHash,
  event::EventRecord,
  role::Role,
  ticket::{Comment, NewTicket, Status, Ticket},
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

/// Connection settings for the helpdesk server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
  pub base_url: String,
  pub address:  String,
  pub password: String,
}

/// `GET /api/tickets/{id}`: the ticket with its comments inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
  #[serde(flatten)]
  pub ticket:   Ticket,
  pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleView {
  pub address: Address,
  pub role:    Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Uploaded {
  pub hash: ContentHash,
  pub size: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the helpdesk REST API.
///
/// Cheap to clone. The inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn base(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  fn url(&self, path: &str) -> String { format!("{}/api{}", self.base(), path) }

  fn request(&self, method: Method, url: String) -> RequestBuilder {
    let req = self.client.request(method, url);
    if self.config.address.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.address, Some(&self.config.password))
    }
  }

  /// Send `req` once and decode a JSON success body. Mutations are never
  /// retried; a timeout surfaces as an error and the ledger is the source of
  /// truth for whether it landed.
  async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;
    let resp = check(what, resp).await?;
    resp.json().await.with_context(|| format!("deserialising {what} response"))
  }

  // ── Tickets ───────────────────────────────────────────────────────────────

  /// `GET /api/tickets[?status=<s>]`
  pub async fn list_tickets(&self, status: Option<Status>) -> Result<Vec<Ticket>> {
    let mut req = self.request(Method::GET, self.url("/tickets"));
    if let Some(status) = status {
      req = req.query(&[("status", status.to_string())]);
    }
    self.send("GET /tickets", req).await
  }

  /// `GET /api/tickets/{id}`
  pub async fn get_ticket(&self, id: u64) -> Result<TicketDetail> {
    let req = self.request(Method::GET, self.url(&format!("/tickets/{id}")));
    self.send("GET /tickets/{id}", req).await
  }

  /// `POST /api/tickets`
  pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
    let req = self.request(Method::POST, self.url("/tickets")).json(ticket);
    self.send("POST /tickets", req).await
  }

  /// `POST /api/tickets/{id}/status`
  pub async fn update_status(&self, id: u64, status: Status) -> Result<Ticket> {
    let req = self
      .request(Method::POST, self.url(&format!("/tickets/{id}/status")))
      .json(&json!({ "status": status }));
    self.send("POST /tickets/{id}/status", req).await
  }

  /// `POST /api/tickets/{id}/assign`
  pub async fn assign(&self, id: u64, assignee: Address) -> Result<Ticket> {
    let req = self
      .request(Method::POST, self.url(&format!("/tickets/{id}/assign")))
      .json(&json!({ "assignee": assignee }));
    self.send("POST /tickets/{id}/assign", req).await
  }

  /// `POST /api/tickets/{id}/{action}` for the body-less transitions:
  /// `resolve`, `close` and `reopen`.
  pub async fn transition(&self, id: u64, action: &str) -> Result<Ticket> {
    let req = self.request(Method::POST, self.url(&format!("/tickets/{id}/{action}")));
    self.send(&format!("POST /tickets/{{id}}/{action}"), req).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  /// `POST /api/tickets/{id}/comments`
  pub async fn add_comment(&self, id: u64, content: &str) -> Result<Comment> {
    let req = self
      .request(Method::POST, self.url(&format!("/tickets/{id}/comments")))
      .json(&json!({ "content": content }));
    self.send("POST /tickets/{id}/comments", req).await
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  /// `GET /api/me`
  pub async fn whoami(&self) -> Result<RoleView> {
    self.send("GET /me", self.request(Method::GET, self.url("/me"))).await
  }

  /// `GET /api/managers`
  pub async fn managers(&self) -> Result<Vec<Address>> {
    self.send("GET /managers", self.request(Method::GET, self.url("/managers"))).await
  }

  /// `GET /api/roles/{address}`
  pub async fn role_of(&self, address: Address) -> Result<RoleView> {
    let req = self.request(Method::GET, self.url(&format!("/roles/{address}")));
    self.send("GET /roles/{address}", req).await
  }

  /// `PUT /api/roles/{address}`
  pub async fn set_role(&self, address: Address, role: Role) -> Result<RoleView> {
    let req = self
      .request(Method::PUT, self.url(&format!("/roles/{address}")))
      .json(&json!({ "role": role }));
    self.send("PUT /roles/{address}", req).await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// `GET /api/events?since=<seq>[&limit=<n>]`
  pub async fn events(&self, since: u64, limit: Option<usize>) -> Result<Vec<EventRecord>> {
    let mut req = self
      .request(Method::GET, self.url("/events"))
      .query(&[("since", since)]);
    if let Some(limit) = limit {
      req = req.query(&[("limit", limit)]);
    }
    self.send("GET /events", req).await
  }

  // ── Content ───────────────────────────────────────────────────────────────

  /// `POST /content`
  pub async fn upload(&self, bytes: Vec<u8>) -> Result<Uploaded> {
    let req = self
      .request(Method::POST, format!("{}/content", self.base()))
      .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
      .body(bytes);
    self.send("POST /content", req).await
  }

  /// `GET /content/{hash}`
  pub async fn download(&self, hash: &ContentHash) -> Result<Vec<u8>> {
    let req = self.request(Method::GET, format!("{}/content/{hash}", self.base()));
    let resp = req.send().await.context("GET /content/{hash} failed")?;
    let resp = check("GET /content/{hash}", resp).await?;
    Ok(resp.bytes().await.context("reading content body")?.to_vec())
  }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn check(what: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<ErrorBody>()
    .await
    .map(|b| b.error)
    .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
  Err(anyhow!("{what} → {status}: {message}"))
}
