//! Ticket and comment records.
//!
//! Both are owned exclusively by the [`TicketRegistry`](crate::TicketRegistry)
//! and only change through its operations. Comments reference their ticket by
//! id; they are never embedded in the ticket record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::address::Address;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a ticket is in its lifecycle.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
  #[default]
  Open,
  InProgress,
  Resolved,
  Closed,
}

impl Status {
  /// Terminal states are the only ones a ticket can be reopened from.
  pub fn is_terminal(self) -> bool { matches!(self, Self::Resolved | Self::Closed) }
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
  pub id:          u64,
  /// Never changes after creation.
  pub creator:     Address,
  pub assignee:    Option<Address>,
  pub title:       String,
  /// Opaque reference (usually a content hash) to the structured description.
  pub description: String,
  pub attachment:  Option<String>,
  pub status:      Status,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`TicketRegistry::create_ticket`](crate::TicketRegistry::create_ticket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
  pub title:       String,
  pub description: String,
  #[serde(default)]
  pub attachment:  Option<String>,
}

impl NewTicket {
  pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
    Self { title: title.into(), description: description.into(), attachment: None }
  }

  pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
    self.attachment = Some(attachment.into());
    self
  }
}

// ─── Comment ─────────────────────────────────────────────────────────────────

/// An append-only note on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         u64,
  pub ticket_id:  u64,
  pub author:     Address,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}
