//! Lifecycle events.
//!
//! Every accepted mutation emits exactly one event. The ledger records them in
//! commit order so notification and audit views can be rebuilt from any
//! sequence number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{address::Address, role::Role, ticket::Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
  TicketCreated {
    id:      u64,
    creator: Address,
    title:   String,
  },
  StatusUpdated {
    id:      u64,
    status:  Status,
    updater: Address,
  },
  TicketAssigned {
    id:       u64,
    assignee: Address,
    assigner: Address,
  },
  TicketReopened {
    id:       u64,
    reopener: Address,
  },
  CommentAdded {
    id:         u64,
    comment_id: u64,
    author:     Address,
  },
  RoleChanged {
    user:    Address,
    role:    Role,
    changer: Address,
  },
}

impl Event {
  /// The ticket this event concerns, if any.
  pub fn ticket_id(&self) -> Option<u64> {
    match self {
      Self::TicketCreated { id, .. }
      | Self::StatusUpdated { id, .. }
      | Self::TicketAssigned { id, .. }
      | Self::TicketReopened { id, .. }
      | Self::CommentAdded { id, .. } => Some(*id),
      Self::RoleChanged { .. } => None,
    }
  }
}

/// An event as recorded by a ledger, with its position in the global order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
  pub seq:   u64,
  pub at:    DateTime<Utc>,
  pub event: Event,
}
