//! Error types for `helpdesk-core`.

use thiserror::Error;

use crate::{address::Address, ticket::Status};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("ticket not found: {0}")]
  TicketNotFound(u64),

  #[error("{caller} is not allowed to {action}")]
  Unauthorized {
    caller: Address,
    action: &'static str,
  },

  #[error("comment content must not be empty")]
  EmptyComment,

  #[error("ticket title must not be empty")]
  EmptyTitle,

  #[error("assignee {0} does not hold the manager role")]
  AssigneeNotManager(Address),

  #[error("ticket {id} is {status} and cannot be reopened")]
  NotReopenable { id: u64, status: Status },

  #[error("{0} is the last manager and cannot be demoted")]
  LastManager(Address),

  #[error("invalid address {0:?}")]
  InvalidAddress(String),

  #[error("invalid content hash {0:?}")]
  InvalidContentHash(String),
}

/// The three rejection classes a caller needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Unauthorized,
  InvalidArgument,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::TicketNotFound(_) => ErrorKind::NotFound,
      Self::Unauthorized { .. } => ErrorKind::Unauthorized,
      Self::EmptyComment
      | Self::EmptyTitle
      | Self::AssigneeNotManager(_)
      | Self::NotReopenable { .. }
      | Self::LastManager(_)
      | Self::InvalidAddress(_)
      | Self::InvalidContentHash(_) => ErrorKind::InvalidArgument,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
