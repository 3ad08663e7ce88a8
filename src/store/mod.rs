//! Ports to the surrounding application's persistence and push
//! delivery. The lifecycle manager and dispatcher only ever talk to
//! these traits; `MemoryStore` and `SqliteStore` are the bundled
//! implementations.

mod memory;
mod sqlite;

pub use memory::{MemoryStore, RecordingPush};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::{
    EscalationLevel, EscalationRecord, EscalationStatus, NotificationEvent,
    NotificationPreferences, NotificationPriority, Post,
};
use crate::error::Result;

/// Update payload for an escalation record. Unset fields are left
/// untouched by the store.
#[derive(Debug, Default, Clone)]
pub struct EscalationUpdate {
    pub status: Option<EscalationStatus>,
    pub assigned_to: Option<Option<Uuid>>, // Some(None) to clear, Some(Some(id)) to set
    pub resolved_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Records the classifier outcome on the post. Returns false when
    /// the post is unknown or already carries an escalation level; the
    /// level is set once and never silently overwritten.
    async fn mark_escalated(
        &self,
        id: Uuid,
        level: EscalationLevel,
        reason: &str,
    ) -> Result<bool>;

    /// Explicit re-detection path: overwrites the stored level and
    /// reason. Returns false when the post is unknown.
    async fn overwrite_escalation(
        &self,
        id: Uuid,
        level: EscalationLevel,
        reason: &str,
    ) -> Result<bool>;
}

#[async_trait]
pub trait EscalationStore: Send + Sync {
    /// Fails with `DuplicateEscalation` when a record already exists
    /// for the post.
    async fn create_escalation(&self, record: &EscalationRecord) -> Result<()>;

    async fn get_escalation(&self, id: Uuid) -> Result<Option<EscalationRecord>>;

    /// Applies the provided fields only. Returns the updated record,
    /// or None for an unknown id.
    async fn update_escalation(
        &self,
        id: Uuid,
        update: &EscalationUpdate,
    ) -> Result<Option<EscalationRecord>>;

    /// Records whose status is not terminal.
    async fn open_escalations(&self) -> Result<Vec<EscalationRecord>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, event: &NotificationEvent) -> Result<()>;

    /// Unread events for a user, oldest first.
    async fn unread_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationEvent>>;

    async fn mark_read(&self, id: Uuid) -> Result<bool>;

    /// Clears the scheduled flag once a deferred delivery fires.
    async fn mark_delivered(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserGateway: Send + Sync {
    /// None means the user never saved preferences; callers default.
    async fn preferences(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>>;

    /// None means the user has no registered device.
    async fn push_token(&self, user_id: Uuid) -> Result<Option<String>>;
}

/// One outbound push invocation.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub priority: NotificationPriority,
}

#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn push(&self, message: PushMessage) -> Result<()>;
}
