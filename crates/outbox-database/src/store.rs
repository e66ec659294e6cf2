//! Durable outbox store on a dedicated SQLite executor thread.
//!
//! Every operation is sent to a single background thread that owns the
//! connection, so callers await results without blocking the Tokio runtime.
//! Each execution context (ingestion, retry scheduler) opens its own
//! `OutboxStore` on the same file; SQLite's locking plus `busy_timeout`
//! serialises their short write transactions.
//!
//! Only SQL belongs inside [`OutboxStore::call`]. File and network I/O
//! must happen outside, or every other query on the thread waits on it.

use crate::{
    migrations, queries, AppendOutcome, DatabaseError, DatabaseResult, NewOutboxEvent,
    OutboxEvent, TailCursor,
};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// Convert a tokio_rusqlite::Error to DatabaseError.
fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> DatabaseError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => DatabaseError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => {
            DatabaseError::Connection("Connection closed".to_string())
        }
        other => DatabaseError::Connection(other.to_string()),
    }
}

/// Durable, append-only local queue of classified events.
///
/// Cloning shares the same executor thread; clone only within one
/// execution context.
#[derive(Clone)]
pub struct OutboxStore {
    conn: Connection,
    path: String,
}

impl OutboxStore {
    /// Open the store at the given path.
    ///
    /// This will:
    /// - Create the database file (and parent directory) if missing
    /// - Enable WAL with `synchronous = FULL`, so an acknowledged append
    ///   is on stable media
    /// - Run any pending migrations
    pub async fn open(path: &Path) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path_str = path.to_string_lossy().to_string();

        info!(path = %path_str, "Opening outbox store");

        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        conn.call(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = FULL;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;

        Self::migrate(&conn).await?;

        info!(path = %path_str, "Outbox store initialized");

        Ok(Self {
            conn,
            path: path_str,
        })
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Self::migrate(&conn).await?;
        Ok(Self {
            conn,
            path: ":memory:".to_string(),
        })
    }

    async fn migrate(conn: &Connection) -> DatabaseResult<()> {
        conn.call(|conn| Ok(migrations::run_migrations(conn)))
            .await
            .map_err(from_tokio_rusqlite)?
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    /// Execute a closure on the connection, on the executor thread.
    pub async fn call<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Our DatabaseResult rides inside tokio_rusqlite's Ok variant so
        // query errors keep their DatabaseError shape.
        let outer_result = self.conn.call(move |conn| Ok(f(conn))).await;

        match outer_result {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    /// Append an event with `sent = false`.
    ///
    /// Returns [`AppendOutcome::AlreadyExists`] if the `event_id` is
    /// already stored. Any other failure is returned as an error.
    pub async fn append(&self, event: NewOutboxEvent) -> DatabaseResult<AppendOutcome> {
        let outcome = self
            .call(move |conn| queries::insert_event(conn, &event))
            .await?;
        Ok(outcome)
    }

    /// Append an event and advance the tail cursor in one transaction.
    pub async fn append_with_cursor(
        &self,
        event: NewOutboxEvent,
        cursor: TailCursor,
    ) -> DatabaseResult<AppendOutcome> {
        self.call(move |conn| queries::insert_event_with_cursor(conn, &event, &cursor))
            .await
    }

    /// Unsent events ordered by ascending local id, at most `limit`.
    pub async fn fetch_unsent(&self, limit: usize) -> DatabaseResult<Vec<OutboxEvent>> {
        self.call(move |conn| queries::get_unsent_events(conn, limit))
            .await
    }

    /// Mark events as sent. Idempotent; returns the number newly marked.
    pub async fn mark_sent(&self, event_ids: Vec<String>) -> DatabaseResult<usize> {
        let count = self
            .call(move |conn| queries::mark_events_sent(conn, &event_ids))
            .await?;
        debug!(count, "Marked outbox events sent");
        Ok(count)
    }

    /// Look up one event by its global id.
    pub async fn get(&self, event_id: &str) -> DatabaseResult<Option<OutboxEvent>> {
        let event_id = event_id.to_string();
        self.call(move |conn| queries::get_event(conn, &event_id))
            .await
    }

    pub async fn count_unsent(&self) -> DatabaseResult<u64> {
        self.call(|conn| queries::count_events(conn, false)).await
    }

    pub async fn count_sent(&self) -> DatabaseResult<u64> {
        self.call(|conn| queries::count_events(conn, true)).await
    }

    /// Load the saved cursor for a watched path.
    pub async fn load_cursor(&self, path: &str) -> DatabaseResult<Option<TailCursor>> {
        let path = path.to_string();
        self.call(move |conn| queries::get_tail_cursor(conn, &path))
            .await
    }

    /// Persist cursor progress without appending an event.
    pub async fn save_cursor(&self, cursor: TailCursor) -> DatabaseResult<()> {
        self.call(move |conn| queries::upsert_tail_cursor(conn, &cursor))
            .await
    }

    /// Get the database file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Close the connection after pending operations complete.
    pub async fn close(self) -> DatabaseResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to close database: {:?}", e)))?;
        info!(path = %self.path, "Outbox store closed");
        Ok(())
    }
}

impl std::fmt::Debug for OutboxStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
