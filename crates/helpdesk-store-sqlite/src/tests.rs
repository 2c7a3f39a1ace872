//! Integration tests for `SqliteLedger` against in-memory and on-disk
//! databases.

use std::time::Duration;

use helpdesk_core::{
  Address,
  event::Event,
  registry::Operation,
  role::Role,
  store::{LedgerError as _, TicketLedger},
  ticket::{NewTicket, Status},
};

use crate::{Error, SqliteLedger};

const MANAGER: Address = Address::from_bytes([0x01; 20]);
const OTHER_MANAGER: Address = Address::from_bytes([0x02; 20]);
const ALICE: Address = Address::from_bytes([0xa1; 20]);
const BOB: Address = Address::from_bytes([0xb0; 20]);

async fn ledger() -> SqliteLedger {
  SqliteLedger::open_in_memory(MANAGER)
    .await
    .expect("in-memory ledger")
}

fn create(title: &str) -> Operation {
  Operation::CreateTicket(NewTicket::new(title, "bafy-description"))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_create_and_read_back() {
  let l = ledger().await;

  let receipt = l.submit(ALICE, create("Printer jam")).await.unwrap();
  let record = &receipt.record;
  assert_eq!(record.seq, 1);
  assert_eq!(
    record.event,
    Event::TicketCreated { id: 1, creator: ALICE, title: "Printer jam".into() }
  );

  let ticket = l.ticket(1).await.unwrap().unwrap();
  assert_eq!(ticket.creator, ALICE);
  assert_eq!(ticket.status, Status::Open);
  assert_eq!(ticket.assignee, None);
  assert_eq!(l.tickets().await.unwrap().len(), 1);
  assert_eq!(receipt.created, Some(1));
  assert_eq!(receipt.ticket, Some(ticket));
}

#[tokio::test]
async fn missing_ticket_reads_as_none() {
  let l = ledger().await;
  assert!(l.ticket(0).await.unwrap().is_none());
  assert!(l.ticket(1).await.unwrap().is_none());
  assert!(l.comments(1).await.unwrap().is_none());
}

#[tokio::test]
async fn rejection_is_reported_and_not_recorded() {
  let l = ledger().await;
  l.submit(ALICE, create("VPN")).await.unwrap();

  let err = l.submit(BOB, Operation::Close { id: 1 }).await.unwrap_err();
  assert!(matches!(err, Error::Rejected(helpdesk_core::Error::Unauthorized { .. })));
  assert!(err.rejection().is_some());

  assert_eq!(l.head().await, 1);
  assert_eq!(l.ticket(1).await.unwrap().unwrap().status, Status::Open);
}

#[tokio::test]
async fn roles_default_and_change() {
  let l = ledger().await;
  assert_eq!(l.role_of(MANAGER).await.unwrap(), Role::Manager);
  assert_eq!(l.role_of(BOB).await.unwrap(), Role::User);

  l.submit(MANAGER, Operation::SetUserRole { user: BOB, role: Role::Manager })
    .await
    .unwrap();
  assert_eq!(l.role_of(BOB).await.unwrap(), Role::Manager);

  let mut managers = l.managers().await.unwrap();
  managers.sort();
  assert_eq!(managers, vec![MANAGER, BOB]);
}

#[tokio::test]
async fn comments_come_back_in_order() {
  let l = ledger().await;
  l.submit(ALICE, create("Laptop")).await.unwrap();
  for text in ["one", "two", "three"] {
    l.submit(ALICE, Operation::AddComment { id: 1, content: text.into() })
      .await
      .unwrap();
  }
  let comments = l.comments(1).await.unwrap().unwrap();
  let texts: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
  assert_eq!(texts, ["one", "two", "three"]);
  let ids: Vec<_> = comments.iter().map(|c| c.id).collect();
  assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test]
async fn events_since_pages_through_the_log() {
  let l = ledger().await;
  for title in ["a", "b", "c", "d"] {
    l.submit(ALICE, create(title)).await.unwrap();
  }

  let page = l.events_since(0, 2).await.unwrap();
  assert_eq!(page.iter().map(|r| r.seq).collect::<Vec<_>>(), [1, 2]);

  let rest = l.events_since(2, 100).await.unwrap();
  assert_eq!(rest.iter().map(|r| r.seq).collect::<Vec<_>>(), [3, 4]);

  assert!(l.events_since(4, 100).await.unwrap().is_empty());
}

// ─── Replay ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_replays_the_log() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("ledger.db");

  {
    let l = SqliteLedger::open(&path, Some(MANAGER)).await.unwrap();
    l.submit(MANAGER, Operation::SetUserRole { user: OTHER_MANAGER, role: Role::Manager })
      .await
      .unwrap();
    l.submit(ALICE, create("Printer jam")).await.unwrap();
    l.submit(MANAGER, Operation::Assign { id: 1, assignee: OTHER_MANAGER })
      .await
      .unwrap();
    l.submit(OTHER_MANAGER, Operation::Resolve { id: 1 }).await.unwrap();
    l.submit(MANAGER, Operation::Reopen { id: 1 }).await.unwrap();
    l.submit(ALICE, Operation::AddComment { id: 1, content: "still broken".into() })
      .await
      .unwrap();
    // Rejected: never reaches the log.
    let _ = l.submit(ALICE, Operation::Close { id: 1 }).await;
  }

  let l = SqliteLedger::open(&path, None).await.unwrap();
  assert_eq!(l.head().await, 6);
  assert_eq!(l.genesis_manager().await, MANAGER);

  let ticket = l.ticket(1).await.unwrap().unwrap();
  assert_eq!(ticket.status, Status::Open);
  assert_eq!(ticket.assignee, None);

  let comments = l.comments(1).await.unwrap().unwrap();
  assert_eq!(comments.len(), 1);
  assert_eq!(comments[0].id, 1);
  assert_eq!(comments[0].author, ALICE);
  assert_eq!(comments[0].content, "still broken");

  assert_eq!(l.role_of(OTHER_MANAGER).await.unwrap(), Role::Manager);

  // Writes continue from the replayed head.
  let record = l.submit(ALICE, create("Second")).await.unwrap().record;
  assert_eq!(record.seq, 7);
  assert_eq!(record.event, Event::TicketCreated { id: 2, creator: ALICE, title: "Second".into() });
}

#[tokio::test]
async fn replayed_timestamps_are_exact() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("ledger.db");

  let before = {
    let l = SqliteLedger::open(&path, Some(MANAGER)).await.unwrap();
    l.submit(ALICE, create("Clock")).await.unwrap();
    l.ticket(1).await.unwrap().unwrap()
  };

  let l = SqliteLedger::open(&path, Some(MANAGER)).await.unwrap();
  let after = l.ticket(1).await.unwrap().unwrap();
  assert_eq!(before, after);
}

#[tokio::test]
async fn new_ledger_requires_genesis() {
  let dir = tempfile::tempdir().unwrap();
  let err = SqliteLedger::open(dir.path().join("ledger.db"), None)
    .await
    .err()
    .unwrap();
  assert!(matches!(err, Error::MissingGenesis));
}

#[tokio::test]
async fn genesis_mismatch_is_refused() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("ledger.db");
  SqliteLedger::open(&path, Some(MANAGER)).await.unwrap();

  let err = SqliteLedger::open(&path, Some(BOB)).await.err().unwrap();
  assert!(matches!(
    err,
    Error::GenesisMismatch { stored, requested } if stored == MANAGER && requested == BOB
  ));
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn dropped_submit_does_not_wedge_the_ledger() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("ledger.db");
  let l = SqliteLedger::open(&path, Some(MANAGER)).await.unwrap();

  // A zero timeout polls the submit once, then drops it mid-flight.
  let dropped =
    tokio::time::timeout(Duration::ZERO, l.submit(ALICE, create("dropped"))).await;
  assert!(dropped.is_err());

  // Either the dropped submit committed in full or not at all; the next one
  // lands right after it.
  let receipt = l.submit(ALICE, create("kept")).await.unwrap();
  let head = l.head().await;
  assert_eq!(receipt.record.seq, head);
  let tickets = l.tickets().await.unwrap();
  assert_eq!(tickets.len() as u64, head);
  assert_eq!(tickets.last().map(|t| t.title.as_str()), Some("kept"));

  // Memory and disk agree.
  drop(l);
  let reopened = SqliteLedger::open(&path, None).await.unwrap();
  assert_eq!(reopened.head().await, head);
  assert_eq!(reopened.tickets().await.unwrap(), tickets);
}
