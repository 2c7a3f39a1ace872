//! [`SqliteLedger`]: the SQLite implementation of [`TicketLedger`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::RwLock;

use helpdesk_core::{
  Address, TicketRegistry,
  event::EventRecord,
  registry::{Operation, Receipt},
  role::Role,
  store::TicketLedger,
  ticket::{Comment, Ticket},
};

use crate::{
  encode::{
    RawMeta, RawTransaction, encode_address, encode_dt, encode_event, encode_operation,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// A helpdesk ledger backed by a single SQLite file.
///
/// Writers are serialised through the registry lock, which is held while the
/// transaction row is appended, so the in-memory registry and the log never
/// disagree. Readers share the lock and never touch the database.
///
/// Cloning is cheap; the connection and registry are reference-counted.
#[derive(Clone)]
pub struct SqliteLedger {
  conn:     tokio_rusqlite::Connection,
  registry: Arc<RwLock<TicketRegistry>>,
}

impl SqliteLedger {
  /// Open (or create) a ledger at `path` and replay its transaction log.
  ///
  /// `genesis` seeds the manager role when the ledger is new. For an existing
  /// ledger it may be omitted; if given it must match the recorded one.
  pub async fn open(path: impl AsRef<Path>, genesis: Option<Address>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, genesis).await
  }

  /// Open a fresh in-memory ledger, for tests.
  pub async fn open_in_memory(genesis: Address) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, Some(genesis)).await
  }

  async fn init(conn: tokio_rusqlite::Connection, genesis: Option<Address>) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let registry = Self::load(&conn, genesis).await?;
    Ok(Self { conn, registry: Arc::new(RwLock::new(registry)) })
  }

  /// Read or write the genesis record, then rebuild the registry from the
  /// transaction log.
  async fn load(
    conn: &tokio_rusqlite::Connection,
    genesis: Option<Address>,
  ) -> Result<TicketRegistry> {
    let meta: Option<RawMeta> = conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT genesis_manager, created_at FROM ledger_meta WHERE id = 1",
              [],
              |row| {
                Ok(RawMeta {
                  genesis_manager: row.get(0)?,
                  created_at:      row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    let mut registry = match (meta.map(RawMeta::decode).transpose()?, genesis) {
      (Some((stored, _)), Some(requested)) if stored != requested => {
        return Err(Error::GenesisMismatch { stored, requested });
      }
      (Some((manager, created_at)), _) => TicketRegistry::new(manager, created_at),
      (None, Some(manager)) => {
        let created_at = Utc::now();
        let manager_str = encode_address(manager);
        let at_str = encode_dt(created_at);
        conn
          .call(move |conn| {
            conn.execute(
              "INSERT INTO ledger_meta (id, genesis_manager, created_at) VALUES (1, ?1, ?2)",
              rusqlite::params![manager_str, at_str],
            )?;
            Ok(())
          })
          .await?;
        tracing::info!(%manager, "created new ledger");
        TicketRegistry::new(manager, created_at)
      }
      (None, None) => return Err(Error::MissingGenesis),
    };

    let raws: Vec<RawTransaction> = conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT seq, caller, at, operation, event FROM transactions ORDER BY seq")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTransaction {
              seq:       row.get(0)?,
              caller:    row.get(1)?,
              at:        row.get(2)?,
              operation: row.get(3)?,
              event:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    for raw in raws {
      let (tx, event) = raw.decode()?;
      let transition = registry
        .prepare(tx.caller, tx.at, &tx.operation)
        .map_err(|source| Error::Replay { seq: tx.seq, source })?;
      if *transition.transaction() != tx || *transition.event() != event {
        return Err(Error::Divergence(tx.seq));
      }
      registry.commit(transition);
    }

    tracing::debug!(
      seq = registry.seq(),
      tickets = registry.ticket_count(),
      "ledger replayed"
    );
    Ok(registry)
  }

  /// Sequence number of the last committed transaction.
  pub async fn head(&self) -> u64 { self.registry.read().await.seq() }

  pub async fn genesis_manager(&self) -> Address { self.registry.read().await.genesis_manager() }
}

// ─── TicketLedger impl ───────────────────────────────────────────────────────

impl TicketLedger for SqliteLedger {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn submit(&self, caller: Address, operation: Operation) -> Result<Receipt> {
    let mut registry = self.registry.clone().write_owned().await;

    let transition = match registry.prepare(caller, Utc::now(), &operation) {
      Ok(t) => t,
      Err(e) => {
        tracing::debug!(%caller, ?operation, error = %e, "operation rejected");
        return Err(e.into());
      }
    };

    let tx         = transition.transaction();
    let seq_val    = tx.seq as i64;
    let caller_str = encode_address(tx.caller);
    let at_str     = encode_dt(tx.at);
    let op_str     = encode_operation(&tx.operation)?;
    let event_str  = encode_event(transition.event())?;

    // The append and the in-memory commit run on their own task, holding the
    // write lock throughout. Dropping this future cannot separate them.
    let conn = self.conn.clone();
    let task = tokio::spawn(async move {
      conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO transactions (seq, caller, at, operation, event)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![seq_val, caller_str, at_str, op_str, event_str],
          )?;
          Ok(())
        })
        .await?;
      Ok::<_, Error>(registry.commit(transition))
    });

    let receipt = task.await??;
    tracing::info!(seq = receipt.record.seq, %caller, event = ?receipt.record.event, "transaction committed");
    Ok(receipt)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn ticket(&self, id: u64) -> Result<Option<Ticket>> {
    Ok(self.registry.read().await.ticket(id).ok().cloned())
  }

  async fn tickets(&self) -> Result<Vec<Ticket>> {
    Ok(self.registry.read().await.tickets().to_vec())
  }

  async fn comments(&self, id: u64) -> Result<Option<Vec<Comment>>> {
    Ok(self.registry.read().await.comments(id).ok().map(<[Comment]>::to_vec))
  }

  async fn role_of(&self, user: Address) -> Result<Role> {
    Ok(self.registry.read().await.role_of(&user))
  }

  async fn managers(&self) -> Result<Vec<Address>> {
    Ok(self.registry.read().await.managers())
  }

  async fn events_since(&self, since: u64, limit: usize) -> Result<Vec<EventRecord>> {
    let registry = self.registry.read().await;
    Ok(registry.events_since(since).iter().take(limit).cloned().collect())
  }
}
