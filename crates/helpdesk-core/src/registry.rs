//! [`TicketRegistry`]: the ticket state machine and its role table.
//!
//! The registry is a plain value: tickets and their comment lists live in
//! growable tables indexed by `id - 1`, roles live in a map with an explicit
//! `User` default, and every accepted mutation appends one [`EventRecord`] to
//! the event log.
//!
//! Mutations run in two steps. [`TicketRegistry::prepare`] checks every guard
//! against the current state without touching it and yields a [`Transition`];
//! [`TicketRegistry::commit`] applies a transition, cannot fail, and returns a
//! [`Receipt`]. A ledger persists the transition's [`Transaction`] between the
//! two steps, so a rejected or unpersisted operation never leaves a trace.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  address::Address,
  event::{Event, EventRecord},
  role::Role,
  ticket::{Comment, NewTicket, Status, Ticket},
};

// ─── Operations ──────────────────────────────────────────────────────────────

/// A mutating call, as submitted to a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
  CreateTicket(NewTicket),
  UpdateStatus { id: u64, status: Status },
  Assign { id: u64, assignee: Address },
  Resolve { id: u64 },
  Close { id: u64 },
  Reopen { id: u64 },
  AddComment { id: u64, content: String },
  SetUserRole { user: Address, role: Role },
}

/// One entry of the ledger's transaction log: who submitted what, when, and
/// in which position of the global order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub seq:       u64,
  pub caller:    Address,
  /// Clamped ledger time, never earlier than the previous transaction.
  pub at:        DateTime<Utc>,
  pub operation: Operation,
}

/// What a committed operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
  pub record:  EventRecord,
  /// Id of the ticket or comment the operation created, if any.
  pub created: Option<u64>,
  /// The affected ticket as of this commit. `None` for role changes.
  pub ticket:  Option<Ticket>,
}

// ─── Transition ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Change {
  /// Insert a new ticket or overwrite an existing one with the same id.
  PutTicket(Ticket),
  AppendComment(Comment),
  SetRole { user: Address, role: Role },
}

/// A validated mutation, ready to be committed.
///
/// Only valid against the registry state it was prepared from.
#[derive(Debug, Clone)]
pub struct Transition {
  transaction: Transaction,
  change:      Change,
  event:       Event,
}

impl Transition {
  /// The sequence number the committed event will carry.
  pub fn seq(&self) -> u64 { self.transaction.seq }

  /// The clamped ledger time this transition will be recorded at.
  pub fn at(&self) -> DateTime<Utc> { self.transaction.at }

  /// The log entry a ledger must persist before committing.
  pub fn transaction(&self) -> &Transaction { &self.transaction }

  pub fn event(&self) -> &Event { &self.event }
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TicketRegistry {
  genesis_manager: Address,
  created_at:      DateTime<Utc>,
  tickets:         Vec<Ticket>,
  /// Parallel to `tickets`: `comments[i]` belongs to ticket `i + 1`.
  comments:        Vec<Vec<Comment>>,
  comment_count:   u64,
  roles:           BTreeMap<Address, Role>,
  log:             Vec<EventRecord>,
}

impl TicketRegistry {
  /// Create an empty registry whose creator is seeded as a manager.
  pub fn new(creator: Address, at: DateTime<Utc>) -> Self {
    let mut roles = BTreeMap::new();
    roles.insert(creator, Role::Manager);
    Self {
      genesis_manager: creator,
      created_at: at,
      tickets: Vec::new(),
      comments: Vec::new(),
      comment_count: 0,
      roles,
      log: Vec::new(),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn genesis_manager(&self) -> Address { self.genesis_manager }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  pub fn ticket(&self, id: u64) -> Result<&Ticket> {
    self.index(id).map(|i| &self.tickets[i])
  }

  /// All tickets in id order.
  pub fn tickets(&self) -> &[Ticket] { &self.tickets }

  /// Comments on ticket `id`, in insertion order.
  pub fn comments(&self, id: u64) -> Result<&[Comment]> {
    self.index(id).map(|i| self.comments[i].as_slice())
  }

  pub fn role_of(&self, user: &Address) -> Role {
    self.roles.get(user).copied().unwrap_or_default()
  }

  pub fn is_manager(&self, user: &Address) -> bool { self.role_of(user).is_manager() }

  /// Every address currently holding the manager role, sorted.
  pub fn managers(&self) -> Vec<Address> {
    self
      .roles
      .iter()
      .filter(|(_, role)| role.is_manager())
      .map(|(addr, _)| *addr)
      .collect()
  }

  pub fn ticket_count(&self) -> u64 { self.tickets.len() as u64 }

  pub fn comment_count(&self) -> u64 { self.comment_count }

  /// Number of committed operations; also the sequence number of the last
  /// event (0 when nothing has been committed).
  pub fn seq(&self) -> u64 { self.log.len() as u64 }

  /// Events with a sequence number greater than `seq`, oldest first.
  pub fn events_since(&self, seq: u64) -> &[EventRecord] {
    let start = usize::try_from(seq).unwrap_or(usize::MAX).min(self.log.len());
    &self.log[start..]
  }

  fn index(&self, id: u64) -> Result<usize> {
    match usize::try_from(id) {
      Ok(i) if i >= 1 && i <= self.tickets.len() => Ok(i - 1),
      _ => Err(Error::TicketNotFound(id)),
    }
  }

  /// The current ledger time: no operation may be recorded before it.
  fn clock(&self) -> DateTime<Utc> {
    self.log.last().map_or(self.created_at, |record| record.at)
  }

  // ── Two-step mutation ─────────────────────────────────────────────────────

  /// Validate `operation` from `caller` at time `at` against the current
  /// state. Nothing is modified.
  pub fn prepare(
    &self,
    caller: Address,
    at: DateTime<Utc>,
    operation: &Operation,
  ) -> Result<Transition> {
    let at = at.max(self.clock());
    let (change, event) = match operation {
      Operation::CreateTicket(input) => self.prepare_create(caller, at, input)?,
      Operation::UpdateStatus { id, status } => {
        let ticket = self.ticket(*id)?;
        let permitted = ticket.creator == caller
          || ticket.assignee == Some(caller)
          || self.is_manager(&caller);
        if !permitted {
          return Err(Error::Unauthorized { caller, action: "update the status of this ticket" });
        }
        self.with_status(ticket, caller, at, *status)
      }
      Operation::Assign { id, assignee } => {
        let ticket = self.ticket(*id)?;
        self.require_manager(caller, "assign tickets")?;
        if !self.is_manager(assignee) {
          return Err(Error::AssigneeNotManager(*assignee));
        }
        let mut next = ticket.clone();
        next.assignee = Some(*assignee);
        next.status = Status::InProgress;
        next.updated_at = at;
        let event = Event::TicketAssigned { id: *id, assignee: *assignee, assigner: caller };
        (Change::PutTicket(next), event)
      }
      Operation::Resolve { id } => {
        let ticket = self.ticket(*id)?;
        self.require_manager(caller, "resolve tickets")?;
        self.with_status(ticket, caller, at, Status::Resolved)
      }
      Operation::Close { id } => {
        let ticket = self.ticket(*id)?;
        self.require_manager(caller, "close tickets")?;
        self.with_status(ticket, caller, at, Status::Closed)
      }
      Operation::Reopen { id } => {
        let ticket = self.ticket(*id)?;
        self.require_manager(caller, "reopen tickets")?;
        if !ticket.status.is_terminal() {
          return Err(Error::NotReopenable { id: *id, status: ticket.status });
        }
        let mut next = ticket.clone();
        next.assignee = None;
        next.status = Status::Open;
        next.updated_at = at;
        (Change::PutTicket(next), Event::TicketReopened { id: *id, reopener: caller })
      }
      Operation::AddComment { id, content } => {
        self.ticket(*id)?;
        if content.is_empty() {
          return Err(Error::EmptyComment);
        }
        let comment = Comment {
          id:         self.comment_count + 1,
          ticket_id:  *id,
          author:     caller,
          content:    content.clone(),
          created_at: at,
        };
        let event = Event::CommentAdded { id: *id, comment_id: comment.id, author: caller };
        (Change::AppendComment(comment), event)
      }
      Operation::SetUserRole { user, role } => {
        self.require_manager(caller, "change user roles")?;
        let demotes_last = !role.is_manager()
          && self.is_manager(user)
          && self.roles.values().filter(|r| r.is_manager()).count() == 1;
        if demotes_last {
          return Err(Error::LastManager(*user));
        }
        let event = Event::RoleChanged { user: *user, role: *role, changer: caller };
        (Change::SetRole { user: *user, role: *role }, event)
      }
    };

    let transaction =
      Transaction { seq: self.seq() + 1, caller, at, operation: operation.clone() };
    Ok(Transition { transaction, change, event })
  }

  fn prepare_create(
    &self,
    caller: Address,
    at: DateTime<Utc>,
    input: &NewTicket,
  ) -> Result<(Change, Event)> {
    if input.title.is_empty() {
      return Err(Error::EmptyTitle);
    }
    let ticket = Ticket {
      id:          self.ticket_count() + 1,
      creator:     caller,
      assignee:    None,
      title:       input.title.clone(),
      description: input.description.clone(),
      attachment:  input.attachment.clone(),
      status:      Status::Open,
      created_at:  at,
      updated_at:  at,
    };
    let event = Event::TicketCreated { id: ticket.id, creator: caller, title: ticket.title.clone() };
    Ok((Change::PutTicket(ticket), event))
  }

  fn with_status(
    &self,
    ticket: &Ticket,
    caller: Address,
    at: DateTime<Utc>,
    status: Status,
  ) -> (Change, Event) {
    let mut next = ticket.clone();
    next.status = status;
    next.updated_at = at;
    let event = Event::StatusUpdated { id: ticket.id, status, updater: caller };
    (Change::PutTicket(next), event)
  }

  fn require_manager(&self, caller: Address, action: &'static str) -> Result<()> {
    if self.is_manager(&caller) {
      Ok(())
    } else {
      Err(Error::Unauthorized { caller, action })
    }
  }

  /// Apply a transition produced by [`prepare`](Self::prepare) on this exact
  /// state.
  pub fn commit(&mut self, transition: Transition) -> Receipt {
    let Transition { transaction, change, event } = transition;
    debug_assert_eq!(transaction.seq, self.seq() + 1, "stale transition");

    let (created, ticket) = match change {
      Change::PutTicket(ticket) => {
        let i = (ticket.id - 1) as usize;
        let snapshot = ticket.clone();
        if i == self.tickets.len() {
          self.tickets.push(ticket);
          self.comments.push(Vec::new());
          (Some(snapshot.id), Some(snapshot))
        } else {
          self.tickets[i] = ticket;
          (None, Some(snapshot))
        }
      }
      Change::AppendComment(comment) => {
        let i = (comment.ticket_id - 1) as usize;
        self.tickets[i].updated_at = comment.created_at;
        self.comment_count = comment.id;
        let created = comment.id;
        self.comments[i].push(comment);
        (Some(created), Some(self.tickets[i].clone()))
      }
      Change::SetRole { user, role } => {
        self.roles.insert(user, role);
        (None, None)
      }
    };

    let record = EventRecord { seq: transaction.seq, at: transaction.at, event };
    self.log.push(record.clone());
    Receipt { record, created, ticket }
  }

  /// Prepare and commit in one step.
  pub fn execute(
    &mut self,
    caller: Address,
    at: DateTime<Utc>,
    operation: &Operation,
  ) -> Result<Receipt> {
    let transition = self.prepare(caller, at, operation)?;
    Ok(self.commit(transition))
  }

  // ── Typed entry points ────────────────────────────────────────────────────

  /// Open a new ticket and return its id.
  pub fn create_ticket(
    &mut self,
    caller: Address,
    at: DateTime<Utc>,
    input: NewTicket,
  ) -> Result<u64> {
    let receipt = self.execute(caller, at, &Operation::CreateTicket(input))?;
    let Some(id) = receipt.created else { unreachable!("a committed create yields its ticket id") };
    Ok(id)
  }

  pub fn update_status(
    &mut self,
    caller: Address,
    at: DateTime<Utc>,
    id: u64,
    status: Status,
  ) -> Result<()> {
    self.execute(caller, at, &Operation::UpdateStatus { id, status }).map(drop)
  }

  pub fn assign(
    &mut self,
    caller: Address,
    at: DateTime<Utc>,
    id: u64,
    assignee: Address,
  ) -> Result<()> {
    self.execute(caller, at, &Operation::Assign { id, assignee }).map(drop)
  }

  pub fn resolve(&mut self, caller: Address, at: DateTime<Utc>, id: u64) -> Result<()> {
    self.execute(caller, at, &Operation::Resolve { id }).map(drop)
  }

  pub fn close(&mut self, caller: Address, at: DateTime<Utc>, id: u64) -> Result<()> {
    self.execute(caller, at, &Operation::Close { id }).map(drop)
  }

  pub fn reopen(&mut self, caller: Address, at: DateTime<Utc>, id: u64) -> Result<()> {
    self.execute(caller, at, &Operation::Reopen { id }).map(drop)
  }

  /// Append a comment to ticket `id` and return the comment's id.
  pub fn add_comment(
    &mut self,
    caller: Address,
    at: DateTime<Utc>,
    id: u64,
    content: impl Into<String>,
  ) -> Result<u64> {
    let receipt = self.execute(caller, at, &Operation::AddComment { id, content: content.into() })?;
    let Some(comment_id) = receipt.created else { unreachable!("a committed comment yields its id") };
    Ok(comment_id)
  }

  pub fn set_user_role(
    &mut self,
    caller: Address,
    at: DateTime<Utc>,
    user: Address,
    role: Role,
  ) -> Result<()> {
    self.execute(caller, at, &Operation::SetUserRole { user, role }).map(drop)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::ErrorKind;

  const M: Address = Address::from_bytes([0x01; 20]);
  const M2: Address = Address::from_bytes([0x02; 20]);
  const A: Address = Address::from_bytes([0x0a; 20]);
  const B: Address = Address::from_bytes([0x0b; 20]);

  fn t(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap() }

  fn registry() -> TicketRegistry { TicketRegistry::new(M, t(0)) }

  fn ticket(reg: &mut TicketRegistry, caller: Address, title: &str) -> u64 {
    reg
      .create_ticket(caller, t(1), NewTicket::new(title, "bafy-description"))
      .unwrap()
  }

  // ─── Bootstrap & roles ──────────────────────────────────────────────────

  #[test]
  fn creator_is_seeded_as_manager() {
    let reg = registry();
    assert_eq!(reg.role_of(&M), Role::Manager);
    assert_eq!(reg.managers(), vec![M]);
  }

  #[test]
  fn unknown_addresses_default_to_user() {
    let reg = registry();
    assert_eq!(reg.role_of(&A), Role::User);
  }

  #[test]
  fn only_managers_change_roles() {
    let mut reg = registry();
    let err = reg.set_user_role(A, t(1), B, Role::Manager).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(reg.role_of(&B), Role::User);

    reg.set_user_role(M, t(2), B, Role::Manager).unwrap();
    assert_eq!(reg.role_of(&B), Role::Manager);
    reg.set_user_role(B, t(3), B, Role::User).unwrap();
    assert_eq!(reg.role_of(&B), Role::User);
  }

  #[test]
  fn last_manager_cannot_be_demoted() {
    let mut reg = registry();
    let err = reg.set_user_role(M, t(1), M, Role::User).unwrap_err();
    assert_eq!(err, Error::LastManager(M));
    assert!(reg.is_manager(&M));
    assert_eq!(reg.seq(), 0);
  }

  #[test]
  fn set_user_role_emits_role_changed() {
    let mut reg = registry();
    reg.set_user_role(M, t(1), M2, Role::Manager).unwrap();
    assert_eq!(
      reg.events_since(0)[0].event,
      Event::RoleChanged { user: M2, role: Role::Manager, changer: M }
    );
  }

  // ─── Creation ───────────────────────────────────────────────────────────

  #[test]
  fn create_assigns_sequential_ids_from_one() {
    let mut reg = registry();
    assert_eq!(ticket(&mut reg, A, "first"), 1);
    assert_eq!(ticket(&mut reg, B, "second"), 2);
    assert_eq!(ticket(&mut reg, A, "third"), 3);
    let ids: Vec<_> = reg.tickets().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[test]
  fn created_ticket_is_open_and_unassigned() {
    let mut reg = registry();
    let input = NewTicket::new("VPN down", "bafy-desc").with_attachment("bafy-screenshot");
    let id = reg.create_ticket(A, t(5), input).unwrap();

    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.status, Status::Open);
    assert_eq!(ticket.assignee, None);
    assert_eq!(ticket.creator, A);
    assert_eq!(ticket.attachment.as_deref(), Some("bafy-screenshot"));
    assert_eq!(ticket.created_at, t(5));
    assert_eq!(ticket.updated_at, t(5));
    assert_eq!(
      reg.events_since(0)[0].event,
      Event::TicketCreated { id, creator: A, title: "VPN down".into() }
    );
  }

  #[test]
  fn empty_title_is_rejected() {
    let mut reg = registry();
    let err = reg.create_ticket(A, t(1), NewTicket::new("", "desc")).unwrap_err();
    assert_eq!(err, Error::EmptyTitle);
    assert_eq!(reg.ticket_count(), 0);
  }

  #[test]
  fn clock_never_goes_backwards() {
    let mut reg = registry();
    let id = reg.create_ticket(A, t(10), NewTicket::new("x", "y")).unwrap();
    reg.update_status(A, t(3), id, Status::Closed).unwrap();
    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.updated_at, t(10));
    assert!(ticket.updated_at >= ticket.created_at);
  }

  // ─── Existence ──────────────────────────────────────────────────────────

  #[test]
  fn id_zero_and_unissued_ids_are_not_found() {
    let mut reg = registry();
    ticket(&mut reg, A, "only");
    for id in [0, 2, u64::MAX] {
      assert_eq!(reg.ticket(id).unwrap_err(), Error::TicketNotFound(id));
      assert_eq!(reg.comments(id).unwrap_err(), Error::TicketNotFound(id));
      assert_eq!(reg.resolve(M, t(2), id).unwrap_err(), Error::TicketNotFound(id));
      assert_eq!(reg.add_comment(A, t(2), id, "hi").unwrap_err(), Error::TicketNotFound(id));
    }
  }

  #[test]
  fn not_found_takes_precedence_over_unauthorized() {
    let mut reg = registry();
    let err = reg.close(A, t(1), 7).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  // ─── update_status ──────────────────────────────────────────────────────

  #[test]
  fn update_status_allows_creator_assignee_and_managers() {
    let mut reg = registry();
    reg.set_user_role(M, t(1), M2, Role::Manager).unwrap();
    let id = ticket(&mut reg, A, "laptop");

    reg.update_status(A, t(2), id, Status::InProgress).unwrap();
    reg.update_status(M, t(3), id, Status::Resolved).unwrap();
    reg.assign(M, t(4), id, M2).unwrap();
    reg.set_user_role(M, t(5), M2, Role::User).unwrap();
    // Still permitted as the assignee after losing the manager role.
    reg.update_status(M2, t(6), id, Status::Closed).unwrap();
    assert_eq!(reg.ticket(id).unwrap().status, Status::Closed);
  }

  #[test]
  fn update_status_rejects_unrelated_users() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "laptop");
    let err = reg.update_status(B, t(2), id, Status::Closed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(reg.ticket(id).unwrap().status, Status::Open);
  }

  #[test]
  fn update_status_permits_skips_and_self_transitions() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "printer");
    reg.update_status(A, t(2), id, Status::Open).unwrap();
    reg.update_status(A, t(3), id, Status::Closed).unwrap();
    reg.update_status(A, t(4), id, Status::InProgress).unwrap();
    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.status, Status::InProgress);
    assert_eq!(ticket.updated_at, t(4));
    assert_eq!(
      reg.events_since(3)[0].event,
      Event::StatusUpdated { id, status: Status::InProgress, updater: A }
    );
  }

  // ─── assign / resolve / close ───────────────────────────────────────────

  #[test]
  fn assign_requires_manager_assignee() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "email");
    let err = reg.assign(M, t(2), id, B).unwrap_err();
    assert_eq!(err, Error::AssigneeNotManager(B));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.assignee, None);
    assert_eq!(ticket.status, Status::Open);
  }

  #[test]
  fn assign_requires_manager_caller() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "email");
    let err = reg.assign(A, t(2), id, M).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
  }

  #[test]
  fn assign_moves_to_in_progress() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "email");
    reg.assign(M, t(2), id, M).unwrap();
    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.status, Status::InProgress);
    assert_eq!(ticket.assignee, Some(M));
  }

  #[test]
  fn assign_is_not_gated_on_source_state() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "email");
    reg.close(M, t(2), id).unwrap();
    reg.assign(M, t(3), id, M).unwrap();
    assert_eq!(reg.ticket(id).unwrap().status, Status::InProgress);
  }

  #[test]
  fn resolve_and_close_require_manager() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "wifi");
    assert_eq!(reg.resolve(A, t(2), id).unwrap_err().kind(), ErrorKind::Unauthorized);
    assert_eq!(reg.close(A, t(2), id).unwrap_err().kind(), ErrorKind::Unauthorized);

    reg.resolve(M, t(3), id).unwrap();
    assert_eq!(reg.ticket(id).unwrap().status, Status::Resolved);
    reg.close(M, t(4), id).unwrap();
    assert_eq!(reg.ticket(id).unwrap().status, Status::Closed);
  }

  // ─── reopen ─────────────────────────────────────────────────────────────

  #[test]
  fn reopen_only_from_terminal_states() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "monitor");

    let err = reg.reopen(M, t(2), id).unwrap_err();
    assert_eq!(err, Error::NotReopenable { id, status: Status::Open });

    reg.assign(M, t(3), id, M).unwrap();
    let err = reg.reopen(M, t(4), id).unwrap_err();
    assert_eq!(err, Error::NotReopenable { id, status: Status::InProgress });

    reg.close(M, t(5), id).unwrap();
    reg.reopen(M, t(6), id).unwrap();
    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.status, Status::Open);
    assert_eq!(ticket.assignee, None);

    reg.resolve(M, t(7), id).unwrap();
    reg.reopen(M, t(8), id).unwrap();
    assert_eq!(
      reg.events_since(reg.seq() - 1)[0].event,
      Event::TicketReopened { id, reopener: M }
    );
  }

  #[test]
  fn reopen_requires_manager() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "monitor");
    reg.close(M, t(2), id).unwrap();
    assert_eq!(reg.reopen(A, t(3), id).unwrap_err().kind(), ErrorKind::Unauthorized);
    assert_eq!(reg.ticket(id).unwrap().status, Status::Closed);
  }

  // ─── Comments ───────────────────────────────────────────────────────────

  #[test]
  fn empty_comment_is_rejected() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "keyboard");
    assert_eq!(reg.add_comment(A, t(2), id, "").unwrap_err(), Error::EmptyComment);
    assert!(reg.comments(id).unwrap().is_empty());
    assert_eq!(reg.comment_count(), 0);
  }

  #[test]
  fn comments_append_in_order_with_global_ids() {
    let mut reg = registry();
    let first = ticket(&mut reg, A, "keyboard");
    let second = ticket(&mut reg, B, "mouse");

    assert_eq!(reg.add_comment(A, t(2), first, "sticky keys").unwrap(), 1);
    assert_eq!(reg.add_comment(B, t(3), second, "no scroll").unwrap(), 2);
    assert_eq!(reg.add_comment(M, t(4), first, "replacing").unwrap(), 3);

    let comments = reg.comments(first).unwrap();
    let summary: Vec<_> = comments.iter().map(|c| (c.id, c.author, c.content.as_str())).collect();
    assert_eq!(summary, vec![(1, A, "sticky keys"), (3, M, "replacing")]);
    assert_eq!(reg.comments(second).unwrap()[0].ticket_id, second);
    assert_eq!(reg.ticket(first).unwrap().updated_at, t(4));
  }

  // ─── Atomicity ──────────────────────────────────────────────────────────

  #[test]
  fn rejected_operations_leave_no_trace() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "badge reader");
    let before = (reg.ticket(id).unwrap().clone(), reg.seq(), reg.comment_count());

    let attempts = [
      Operation::UpdateStatus { id, status: Status::Closed },
      Operation::Assign { id, assignee: M },
      Operation::Resolve { id },
      Operation::Close { id },
      Operation::Reopen { id },
      Operation::SetUserRole { user: B, role: Role::Manager },
    ];
    for op in &attempts {
      assert!(reg.execute(B, t(9), op).is_err(), "{op:?} should be rejected");
    }
    assert!(reg.execute(A, t(9), &Operation::AddComment { id, content: String::new() }).is_err());

    let after = (reg.ticket(id).unwrap().clone(), reg.seq(), reg.comment_count());
    assert_eq!(before, after);
  }

  #[test]
  fn prepare_does_not_mutate() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "chair");
    let transition = reg.prepare(M, t(2), &Operation::Close { id }).unwrap();

    assert_eq!(reg.ticket(id).unwrap().status, Status::Open);
    assert_eq!(transition.seq(), 2);

    let receipt = reg.commit(transition);
    assert_eq!(receipt.record.seq, 2);
    assert_eq!(reg.ticket(id).unwrap().status, Status::Closed);
  }

  #[test]
  fn receipts_carry_created_ids_and_committed_tickets() {
    let mut reg = registry();
    let create = Operation::CreateTicket(NewTicket::new("Monitor flicker", "bafy-mon"));
    let receipt = reg.execute(A, t(1), &create).unwrap();
    assert_eq!(receipt.created, Some(1));
    assert_eq!(receipt.ticket.as_ref(), Some(reg.ticket(1).unwrap()));

    let receipt = reg
      .execute(A, t(2), &Operation::AddComment { id: 1, content: "flickers at 60Hz".into() })
      .unwrap();
    assert_eq!(receipt.created, Some(1));
    assert_eq!(receipt.ticket.map(|t| t.updated_at), Some(t(2)));

    let receipt = reg.execute(M, t(3), &Operation::Close { id: 1 }).unwrap();
    assert_eq!(receipt.created, None);
    assert_eq!(receipt.ticket.map(|t| t.status), Some(Status::Closed));

    let receipt = reg
      .execute(M, t(4), &Operation::SetUserRole { user: B, role: Role::Manager })
      .unwrap();
    assert_eq!((receipt.created, receipt.ticket), (None, None));
    assert_eq!(receipt.record.seq, 4);
  }

  #[test]
  fn transition_carries_its_log_entry() {
    let reg = registry();
    let op = Operation::CreateTicket(NewTicket::new("Dock", "bafy-dock"));
    let transition = reg.prepare(A, t(5), &op).unwrap();
    let expected = Transaction { seq: 1, caller: A, at: t(5), operation: op };
    assert_eq!(transition.transaction(), &expected);
  }

  // ─── Events ─────────────────────────────────────────────────────────────

  #[test]
  fn one_event_per_accepted_mutation() {
    let mut reg = registry();
    let id = ticket(&mut reg, A, "phone");
    reg.add_comment(A, t(2), id, "no dial tone").unwrap();
    let _ = reg.close(A, t(3), id);
    reg.close(M, t(4), id).unwrap();

    let seqs: Vec<_> = reg.events_since(0).iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(reg.events_since(2).len(), 1);
    assert!(reg.events_since(10).is_empty());
  }

  // ─── End-to-end ─────────────────────────────────────────────────────────

  #[test]
  fn printer_jam_scenario() {
    let mut reg = registry();
    reg.set_user_role(M, t(1), M2, Role::Manager).unwrap();

    let id = reg
      .create_ticket(A, t(2), NewTicket::new("Printer jam", "bafy-printer"))
      .unwrap();
    assert_eq!(id, 1);
    assert_eq!(reg.ticket(id).unwrap().status, Status::Open);

    reg.assign(M, t(3), id, M2).unwrap();
    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.status, Status::InProgress);
    assert_eq!(ticket.assignee, Some(M2));

    reg.resolve(M2, t(4), id).unwrap();
    assert_eq!(reg.ticket(id).unwrap().status, Status::Resolved);

    reg.reopen(M, t(5), id).unwrap();
    let comment_id = reg.add_comment(A, t(6), id, "still broken").unwrap();
    assert_eq!(comment_id, 1);

    let ticket = reg.ticket(id).unwrap();
    assert_eq!(ticket.status, Status::Open);
    assert_eq!(ticket.assignee, None);
    let comments = reg.comments(id).unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, 1);
    assert_eq!(comments[0].author, A);
    assert_eq!(comments[0].content, "still broken");
    assert_eq!(comments[0].created_at, t(0) + Duration::seconds(6));
  }
}
