//! In-memory collaborators for tests and single-process embedders.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entity::{
    EscalationLevel, EscalationRecord, NotificationEvent, NotificationPreferences, Post,
    PostStatus,
};
use crate::error::{HavenError, Result};

use super::{
    EscalationStore, EscalationUpdate, NotificationStore, PostStore, PushDelivery, PushMessage,
    UserGateway,
};

/// Implements every store port over locked hash maps.
#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<HashMap<Uuid, Post>>,
    escalations: Mutex<HashMap<Uuid, EscalationRecord>>,
    notifications: Mutex<HashMap<Uuid, NotificationEvent>>,
    preferences: Mutex<HashMap<Uuid, NotificationPreferences>>,
    tokens: Mutex<HashMap<Uuid, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.lock().unwrap().insert(post.id, post);
    }

    pub fn set_preferences(&self, prefs: NotificationPreferences) {
        self.preferences.lock().unwrap().insert(prefs.user_id, prefs);
    }

    pub fn set_push_token(&self, user_id: Uuid, token: String) {
        self.tokens.lock().unwrap().insert(user_id, token);
    }

    pub fn notification(&self, id: Uuid) -> Option<NotificationEvent> {
        self.notifications.lock().unwrap().get(&id).cloned()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.lock().unwrap().get(&id).cloned())
    }

    async fn mark_escalated(
        &self,
        id: Uuid,
        level: EscalationLevel,
        reason: &str,
    ) -> Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        match posts.get_mut(&id) {
            Some(post) if post.escalation_level.is_none() => {
                post.status = PostStatus::Escalated;
                post.escalation_level = Some(level);
                post.escalation_reason = Some(reason.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn overwrite_escalation(
        &self,
        id: Uuid,
        level: EscalationLevel,
        reason: &str,
    ) -> Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        match posts.get_mut(&id) {
            Some(post) => {
                post.escalation_level = Some(level);
                post.escalation_reason = Some(reason.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EscalationStore for MemoryStore {
    async fn create_escalation(&self, record: &EscalationRecord) -> Result<()> {
        let mut escalations = self.escalations.lock().unwrap();
        if escalations.values().any(|r| r.post_id == record.post_id) {
            return Err(HavenError::DuplicateEscalation(record.post_id));
        }
        escalations.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_escalation(&self, id: Uuid) -> Result<Option<EscalationRecord>> {
        Ok(self.escalations.lock().unwrap().get(&id).cloned())
    }

    async fn update_escalation(
        &self,
        id: Uuid,
        update: &EscalationUpdate,
    ) -> Result<Option<EscalationRecord>> {
        let mut escalations = self.escalations.lock().unwrap();
        let Some(record) = escalations.get_mut(&id) else {
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
        Ok(Some(record.clone()))
    }

    async fn open_escalations(&self) -> Result<Vec<EscalationRecord>> {
        Ok(self
            .escalations
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.status.is_terminal())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(&self, event: &NotificationEvent) -> Result<()> {
        self.notifications
            .lock()
            .unwrap()
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn unread_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationEvent>> {
        let mut events: Vec<NotificationEvent> = self
            .notifications
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user_id && !e.read)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool> {
        let mut notifications = self.notifications.lock().unwrap();
        match notifications.get_mut(&id) {
            Some(event) => {
                event.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<bool> {
        let mut notifications = self.notifications.lock().unwrap();
        match notifications.get_mut(&id) {
            Some(event) => {
                event.scheduled = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserGateway for MemoryStore {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>> {
        Ok(self.preferences.lock().unwrap().get(&user_id).cloned())
    }

    async fn push_token(&self, user_id: Uuid) -> Result<Option<String>> {
        Ok(self.tokens.lock().unwrap().get(&user_id).cloned())
    }
}

/// Push sink that records every message for assertions.
#[derive(Default)]
pub struct RecordingPush {
    messages: Mutex<Vec<PushMessage>>,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<PushMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushDelivery for RecordingPush {
    async fn push(&self, message: PushMessage) -> Result<()> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}
