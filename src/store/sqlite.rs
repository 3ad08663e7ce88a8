//! SQLite-backed store for escalations and notifications.
//!
//! The unique index on escalations(post_id) closes the race where two
//! writers both try to open an escalation for the same post: the
//! second insert fails with `DuplicateEscalation`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::entity::{EscalationRecord, NotificationEvent};
use crate::error::{HavenError, Result};

use super::{EscalationStore, EscalationUpdate, NotificationStore};

const STORE_DB: &str = "haven.db";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    #[allow(dead_code)]
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create the store database in the given directory.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_DB);
        let conn = Connection::open(&path)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Transient store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS escalations (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                level TEXT NOT NULL,
                reason TEXT NOT NULL,
                detected_at TEXT NOT NULL,
                assigned_to TEXT,
                status TEXT NOT NULL,
                resolved_at TEXT,
                notes TEXT
            )",
            [],
        )?;

        // One escalation per post, enforced at the storage boundary.
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_escalations_post ON escalations(post_id)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                data TEXT NOT NULL,
                priority TEXT NOT NULL,
                scheduled INTEGER NOT NULL,
                read INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, read)",
            [],
        )?;

        Ok(())
    }
}

fn parse_error(what: &str, value: impl std::fmt::Display) -> HavenError {
    HavenError::Storage(format!("cannot parse {}: {}", what, value))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse().map_err(|_| parse_error("uuid", s))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| parse_error("timestamp", s))
}

fn escalation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEscalation> {
    Ok(RawEscalation {
        id: row.get(0)?,
        post_id: row.get(1)?,
        level: row.get(2)?,
        reason: row.get(3)?,
        detected_at: row.get(4)?,
        assigned_to: row.get(5)?,
        status: row.get(6)?,
        resolved_at: row.get(7)?,
        notes: row.get(8)?,
    })
}

/// Column values as stored, before parsing into domain types.
struct RawEscalation {
    id: String,
    post_id: String,
    level: String,
    reason: String,
    detected_at: String,
    assigned_to: Option<String>,
    status: String,
    resolved_at: Option<String>,
    notes: Option<String>,
}

impl RawEscalation {
    fn into_record(self) -> Result<EscalationRecord> {
        Ok(EscalationRecord {
            id: parse_uuid(&self.id)?,
            post_id: parse_uuid(&self.post_id)?,
            level: self
                .level
                .parse()
                .map_err(|_| parse_error("escalation level", &self.level))?,
            reason: self.reason,
            detected_at: parse_time(&self.detected_at)?,
            assigned_to: match self.assigned_to {
                Some(s) => Some(parse_uuid(&s)?),
                None => None,
            },
            status: self
                .status
                .parse()
                .map_err(|_| parse_error("escalation status", &self.status))?,
            resolved_at: match self.resolved_at {
                Some(s) => Some(parse_time(&s)?),
                None => None,
            },
            notes: self.notes,
        })
    }
}

#[async_trait]
impl EscalationStore for SqliteStore {
    async fn create_escalation(&self, record: &EscalationRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO escalations
             (id, post_id, level, reason, detected_at, assigned_to, status, resolved_at, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id.to_string(),
                record.post_id.to_string(),
                record.level.to_string(),
                record.reason,
                record.detected_at.to_rfc3339(),
                record.assigned_to.map(|id| id.to_string()),
                record.status.to_string(),
                record.resolved_at.map(|t| t.to_rfc3339()),
                record.notes,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(HavenError::DuplicateEscalation(record.post_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_escalation(&self, id: Uuid) -> Result<Option<EscalationRecord>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                "SELECT id, post_id, level, reason, detected_at, assigned_to, status, resolved_at, notes
                 FROM escalations WHERE id = ?1",
                [id.to_string()],
                escalation_from_row,
            )
            .optional()?;
        raw.map(RawEscalation::into_record).transpose()
    }

    async fn update_escalation(
        &self,
        id: Uuid,
        update: &EscalationUpdate,
    ) -> Result<Option<EscalationRecord>> {
        let Some(mut record) = self.get_escalation(id).await? else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(assigned_to) = update.assigned_to {
            record.assigned_to = assigned_to;
        }
        if let Some(resolved_at) = update.resolved_at {
            record.resolved_at = resolved_at;
        }
        if let Some(ref notes) = update.notes {
            record.notes = notes.clone();
        }

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE escalations
             SET status = ?2, assigned_to = ?3, resolved_at = ?4, notes = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                record.status.to_string(),
                record.assigned_to.map(|u| u.to_string()),
                record.resolved_at.map(|t| t.to_rfc3339()),
                record.notes,
            ],
        )?;
        Ok(Some(record))
    }

    async fn open_escalations(&self) -> Result<Vec<EscalationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, post_id, level, reason, detected_at, assigned_to, status, resolved_at, notes
             FROM escalations WHERE status IN ('pending', 'in-progress')",
        )?;
        let raws = stmt
            .query_map([], escalation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawEscalation::into_record).collect()
    }
}

#[async_trait]
impl NotificationStore for SqliteStore {
    async fn create_notification(&self, event: &NotificationEvent) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO notifications
             (id, user_id, type, title, body, data, priority, scheduled, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                event.id.to_string(),
                event.user_id.to_string(),
                event.kind.to_string(),
                event.title,
                event.body,
                event.data.to_string(),
                event.priority.to_string(),
                event.scheduled,
                event.read,
                event.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn unread_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, type, title, body, data, priority, scheduled, read, created_at
             FROM notifications WHERE user_id = ?1 AND read = 0
             ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map([user_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, bool>(7)?,
                    row.get::<_, bool>(8)?,
                    row.get::<_, String>(9)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, user, kind, title, body, data, priority, scheduled, read, created_at)| {
                    Ok(NotificationEvent {
                        id: parse_uuid(&id)?,
                        user_id: parse_uuid(&user)?,
                        kind: kind
                            .parse()
                            .map_err(|_| parse_error("notification type", &kind))?,
                        title,
                        body,
                        data: serde_json::from_str(&data)?,
                        priority: priority
                            .parse()
                            .map_err(|_| parse_error("notification priority", &priority))?,
                        scheduled,
                        read,
                        created_at: parse_time(&created_at)?,
                    })
                },
            )
            .collect()
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE notifications SET scheduled = 0 WHERE id = ?1",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

impl From<rusqlite::Error> for HavenError {
    fn from(e: rusqlite::Error) -> Self {
        HavenError::Storage(format!("SQLite error: {}", e))
    }
}
