//! Plain-text rendering of API responses.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use helpdesk_core::{
  Address,
  event::{Event, EventRecord},
  ticket::{Comment, Ticket},
};

use crate::client::{RoleView, TicketDetail};

fn when(at: &DateTime<Utc>) -> String { at.format("%Y-%m-%d %H:%M").to_string() }

fn who(address: &Option<Address>) -> String {
  address.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One line per ticket: id, status, assignee and title.
pub fn ticket_table(tickets: &[Ticket]) -> String {
  if tickets.is_empty() {
    return "no tickets\n".to_string();
  }
  let mut out = String::new();
  let _ = writeln!(out, "{:>5}  {:<12} {:<42} TITLE", "ID", "STATUS", "ASSIGNEE");
  for t in tickets {
    let _ = writeln!(
      out,
      "{:>5}  {:<12} {:<42} {}",
      t.id,
      t.status.to_string(),
      who(&t.assignee),
      t.title
    );
  }
  out
}

pub fn ticket(t: &Ticket) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "#{} {}", t.id, t.title);
  let _ = writeln!(out, "  status:      {}", t.status);
  let _ = writeln!(out, "  creator:     {}", t.creator);
  let _ = writeln!(out, "  assignee:    {}", who(&t.assignee));
  let _ = writeln!(out, "  description: {}", t.description);
  if let Some(attachment) = &t.attachment {
    let _ = writeln!(out, "  attachment:  {attachment}");
  }
  let _ = writeln!(out, "  created:     {}", when(&t.created_at));
  let _ = writeln!(out, "  updated:     {}", when(&t.updated_at));
  out
}

pub fn comment(c: &Comment) -> String {
  format!("  [{}] {} {}: {}\n", c.id, when(&c.created_at), c.author, c.content)
}

pub fn ticket_detail(detail: &TicketDetail) -> String {
  let mut out = ticket(&detail.ticket);
  if !detail.comments.is_empty() {
    out.push_str("comments:\n");
    for c in &detail.comments {
      out.push_str(&comment(c));
    }
  }
  out
}

pub fn role(view: &RoleView) -> String { format!("{} {}\n", view.address, view.role) }

pub fn event(record: &EventRecord) -> String {
  let detail = match &record.event {
    Event::TicketCreated { id, creator, title } => {
      format!("ticket #{id} created by {creator}: {title}")
    }
    Event::StatusUpdated { id, status, updater } => {
      format!("ticket #{id} set to {status} by {updater}")
    }
    Event::TicketAssigned { id, assignee, assigner } => {
      format!("ticket #{id} assigned to {assignee} by {assigner}")
    }
    Event::TicketReopened { id, reopener } => format!("ticket #{id} reopened by {reopener}"),
    Event::CommentAdded { id, comment_id, author } => {
      format!("comment {comment_id} on ticket #{id} by {author}")
    }
    Event::RoleChanged { user, role, changer } => {
      format!("{user} is now {role} (by {changer})")
    }
  };
  format!("{:>6} {} {detail}\n", record.seq, when(&record.at))
}
