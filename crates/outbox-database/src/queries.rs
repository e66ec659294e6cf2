//! Query helpers for the outbox and tail cursor tables.
//!
//! These are plain functions over a connection so they can run inside
//! [`OutboxStore::call`](crate::OutboxStore::call) on the executor thread.

use crate::{
    AppendOutcome, DatabaseResult, FileIdentity, NewOutboxEvent, OutboxEvent, Severity, TailCursor,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// Outbox
// ==========================================

/// Insert a new unsent event.
///
/// An existing `event_id` leaves the table untouched and reports
/// [`AppendOutcome::AlreadyExists`].
pub fn insert_event(conn: &Connection, event: &NewOutboxEvent) -> DatabaseResult<AppendOutcome> {
    let changed = conn.execute(
        "INSERT INTO outbox (event_id, timestamp, message, severity, sent)
         VALUES (?1, ?2, ?3, ?4, 0)
         ON CONFLICT(event_id) DO NOTHING",
        params![
            event.event_id,
            event.timestamp,
            event.message,
            event.severity.as_str(),
        ],
    )?;

    Ok(if changed == 0 {
        AppendOutcome::AlreadyExists
    } else {
        AppendOutcome::Inserted
    })
}

/// Get unsent events, oldest first.
pub fn get_unsent_events(conn: &Connection, limit: usize) -> DatabaseResult<Vec<OutboxEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, event_id, timestamp, message, severity, sent
         FROM outbox
         WHERE sent = 0
         ORDER BY id ASC
         LIMIT ?1",
    )?;

    let events = stmt
        .query_map(params![limit as i64], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Mark events as sent. Returns how many records flipped from unsent to sent.
///
/// Runs in one transaction; ids that are unknown or already sent are ignored.
pub fn mark_events_sent(conn: &mut Connection, event_ids: &[String]) -> DatabaseResult<usize> {
    if event_ids.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut updated = 0;
    {
        let mut stmt =
            tx.prepare_cached("UPDATE outbox SET sent = 1 WHERE event_id = ?1 AND sent = 0")?;
        for event_id in event_ids {
            updated += stmt.execute(params![event_id])?;
        }
    }
    tx.commit()?;

    Ok(updated)
}

/// Get a single event by its global id.
pub fn get_event(conn: &Connection, event_id: &str) -> DatabaseResult<Option<OutboxEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, event_id, timestamp, message, severity, sent
         FROM outbox WHERE event_id = ?1",
    )?;

    Ok(stmt.query_row(params![event_id], row_to_event).optional()?)
}

/// Count events by sent flag.
pub fn count_events(conn: &Connection, sent: bool) -> DatabaseResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM outbox WHERE sent = ?1",
        params![sent],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxEvent> {
    Ok(OutboxEvent {
        local_id: row.get(0)?,
        event_id: row.get(1)?,
        timestamp: row.get(2)?,
        message: row.get(3)?,
        severity: Severity::parse_lossy(&row.get::<_, String>(4)?),
        sent: row.get(5)?,
    })
}

// ==========================================
// Tail cursors
// ==========================================

/// Insert or replace the cursor for a path.
pub fn upsert_tail_cursor(conn: &Connection, cursor: &TailCursor) -> DatabaseResult<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO tail_cursors (path, device, inode, byte_offset, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(path) DO UPDATE SET
            device = excluded.device,
            inode = excluded.inode,
            byte_offset = excluded.byte_offset,
            updated_at = excluded.updated_at",
        params![
            cursor.path,
            cursor.identity.device as i64,
            cursor.identity.inode as i64,
            cursor.offset as i64,
            now,
        ],
    )?;
    Ok(())
}

/// Get the saved cursor for a path.
pub fn get_tail_cursor(conn: &Connection, path: &str) -> DatabaseResult<Option<TailCursor>> {
    let mut stmt = conn.prepare_cached(
        "SELECT path, device, inode, byte_offset FROM tail_cursors WHERE path = ?1",
    )?;

    let cursor = stmt
        .query_row(params![path], |row| {
            Ok(TailCursor {
                path: row.get(0)?,
                identity: FileIdentity {
                    device: row.get::<_, i64>(1)? as u64,
                    inode: row.get::<_, i64>(2)? as u64,
                },
                offset: row.get::<_, i64>(3)? as u64,
            })
        })
        .optional()?;

    Ok(cursor)
}

/// Insert an event and advance the cursor past its line, atomically.
pub fn insert_event_with_cursor(
    conn: &mut Connection,
    event: &NewOutboxEvent,
    cursor: &TailCursor,
) -> DatabaseResult<AppendOutcome> {
    let tx = conn.transaction()?;
    let outcome = insert_event(&tx, event)?;
    upsert_tail_cursor(&tx, cursor)?;
    tx.commit()?;
    Ok(outcome)
}
