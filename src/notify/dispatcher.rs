//! Single-notification orchestration: threshold filter, quiet hours,
//! smart delay, persistence, push delivery.
//!
//! Nothing here raises to the caller: a failed store write or push
//! call is reported to the failure sink and the dispatch returns None.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::entity::{
    DigestInterval, NotificationEvent, NotificationPreferences, NotificationType,
};
use crate::sink::{FailureSink, TracingSink};
use crate::store::{NotificationStore, PushDelivery, PushMessage, UserGateway};

use super::digest::group;
use super::priority::{should_send, smart_delay};
use super::schedule::ScheduledDeliveries;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub notification_id: Uuid,
    /// True when delivery was deferred.
    pub scheduled: bool,
    pub deliver_at: DateTime<Utc>,
}

pub struct Dispatcher {
    notifications: Arc<dyn NotificationStore>,
    users: Arc<dyn UserGateway>,
    push: Arc<dyn PushDelivery>,
    failures: Arc<dyn FailureSink>,
    timers: ScheduledDeliveries,
}

impl Dispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        users: Arc<dyn UserGateway>,
        push: Arc<dyn PushDelivery>,
    ) -> Self {
        Self {
            notifications,
            users,
            push,
            failures: Arc::new(TracingSink),
            timers: ScheduledDeliveries::new(),
        }
    }

    pub fn with_failure_sink(mut self, failures: Arc<dyn FailureSink>) -> Self {
        self.failures = failures;
        self
    }

    /// Dispatches one notification at the current wall clock.
    pub async fn send(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        title: String,
        body: String,
        data: Option<serde_json::Value>,
    ) -> Option<DispatchReceipt> {
        self.send_at(user_id, kind, title, body, data, Utc::now())
            .await
    }

    /// Time-explicit variant used by tests and the digest builder.
    pub async fn send_at(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        title: String,
        body: String,
        data: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Option<DispatchReceipt> {
        let prefs = self.load_preferences(user_id).await;
        let priority = kind.priority();

        if !should_send(priority, &prefs) {
            tracing::debug!(%user_id, kind = %kind, %priority, "notification below threshold, suppressed");
            return None;
        }

        let delay = smart_delay(priority, &prefs, now);
        let mut event = NotificationEvent::new(
            user_id,
            kind,
            title,
            body,
            data.unwrap_or(serde_json::Value::Null),
        );
        event.created_at = now;
        event.scheduled = delay > Duration::zero();

        if let Err(e) = self.notifications.create_notification(&event).await {
            self.failures.record("persist notification", &e);
            return None;
        }

        let deliver_at = now + delay;
        let notification_id = event.id;
        let scheduled = event.scheduled;
        if scheduled {
            let std_delay = delay.to_std().unwrap_or_default();
            tracing::debug!(id = %event.id, delay_secs = std_delay.as_secs(), "notification deferred");

            let users = Arc::clone(&self.users);
            let push = Arc::clone(&self.push);
            let notifications = Arc::clone(&self.notifications);
            let failures = Arc::clone(&self.failures);
            self.timers.schedule(event.id, std_delay, async move {
                deliver(users, push, notifications, failures, event).await;
            });
        } else {
            deliver(
                Arc::clone(&self.users),
                Arc::clone(&self.push),
                Arc::clone(&self.notifications),
                Arc::clone(&self.failures),
                event,
            )
            .await;
        }

        Some(DispatchReceipt {
            notification_id,
            scheduled,
            deliver_at,
        })
    }

    /// Cancels a deferred delivery before its timer fires.
    pub fn cancel_scheduled(&self, notification_id: Uuid) -> bool {
        self.timers.cancel(notification_id)
    }

    pub fn pending_deliveries(&self) -> usize {
        self.timers.pending()
    }

    /// Summarizes a user's unread notifications into one digest
    /// notification. Returns None when there is nothing to digest.
    pub async fn build_digest(&self, user_id: Uuid) -> Option<DispatchReceipt> {
        self.build_digest_at(user_id, Utc::now()).await
    }

    pub async fn build_digest_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<DispatchReceipt> {
        let prefs = self.load_preferences(user_id).await;
        let unread = match self.notifications.unread_notifications(user_id).await {
            Ok(events) => events,
            Err(e) => {
                self.failures.record("load unread notifications", &e);
                return None;
            }
        };

        let window_minutes = match prefs.digest_interval {
            DigestInterval::Hourly => 60,
            DigestInterval::Daily => 24 * 60,
            DigestInterval::Weekly => 7 * 24 * 60,
        };
        let groups = group(&unread, window_minutes, now);
        if groups.is_empty() {
            return None;
        }

        let body = groups
            .iter()
            .map(|g| g.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let total: usize = groups.iter().map(|g| g.count).sum();

        self.send_at(
            user_id,
            NotificationType::System,
            "Activity digest".to_string(),
            body,
            Some(serde_json::json!({ "total": total })),
            now,
        )
        .await
    }

    async fn load_preferences(&self, user_id: Uuid) -> NotificationPreferences {
        match self.users.preferences(user_id).await {
            Ok(Some(prefs)) => prefs,
            Ok(None) => NotificationPreferences::default_for(user_id),
            Err(e) => {
                self.failures.record("load preferences", &e);
                NotificationPreferences::default_for(user_id)
            }
        }
    }
}

/// Pushes to the user's device if one is registered, then clears the
/// scheduled flag for deferred events. Failures are reported, never
/// raised.
async fn deliver(
    users: Arc<dyn UserGateway>,
    push: Arc<dyn PushDelivery>,
    notifications: Arc<dyn NotificationStore>,
    failures: Arc<dyn FailureSink>,
    event: NotificationEvent,
) {
    match users.push_token(event.user_id).await {
        Ok(Some(token)) => {
            let message = PushMessage {
                token,
                title: event.title.clone(),
                body: event.body.clone(),
                data: event.data.clone(),
                priority: event.priority,
            };
            if let Err(e) = push.push(message).await {
                failures.record("push delivery", &e);
            }
        }
        Ok(None) => {
            tracing::debug!(user_id = %event.user_id, "no push token, stored only");
        }
        Err(e) => failures.record("push token lookup", &e),
    }

    if event.scheduled {
        if let Err(e) = notifications.mark_delivered(event.id).await {
            failures.record("mark delivered", &e);
        }
    }
}
