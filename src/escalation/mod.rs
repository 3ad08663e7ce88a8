//! Escalation lifecycle: triage of new posts, record creation,
//! forward-only status transitions, responder assignment, and the
//! responder queue ordering.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::classify::{priority_score, Classification, EscalationClassifier};
use crate::entity::{EscalationLevel, EscalationRecord, NotificationType, Post, PostCategory};
use crate::error::{HavenError, Result};
use crate::notify::Dispatcher;
use crate::sink::{FailureSink, TracingSink};
use crate::store::{EscalationStore, EscalationUpdate, PostStore};

pub struct EscalationManager {
    classifier: EscalationClassifier,
    posts: Arc<dyn PostStore>,
    escalations: Arc<dyn EscalationStore>,
    dispatcher: Arc<Dispatcher>,
    failures: Arc<dyn FailureSink>,
}

impl EscalationManager {
    pub fn new(
        classifier: EscalationClassifier,
        posts: Arc<dyn PostStore>,
        escalations: Arc<dyn EscalationStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            classifier,
            posts,
            escalations,
            dispatcher,
            failures: Arc::new(TracingSink),
        }
    }

    pub fn with_failure_sink(mut self, failures: Arc<dyn FailureSink>) -> Self {
        self.failures = failures;
        self
    }

    /// Classifies a fresh post and, when it crosses the escalation
    /// bar, opens a record and marks the post. Failures degrade to a
    /// post left un-escalated; the posting flow is never blocked.
    pub async fn process_new_post(&self, post: &Post) -> Option<EscalationRecord> {
        if !self.classifier.should_escalate(post) {
            return None;
        }

        let classification = self.classifier.classify(post);
        let (level, reason) = effective_level(post, &classification);

        let record = EscalationRecord::new(post.id, level, reason);
        match self.escalations.create_escalation(&record).await {
            Ok(()) => {}
            Err(HavenError::DuplicateEscalation(_)) => {
                tracing::debug!(post_id = %post.id, "escalation already open for post");
                return None;
            }
            Err(e) => {
                self.failures.record("create escalation", &e);
                return None;
            }
        }
        tracing::info!(post_id = %post.id, level = %record.level, "escalation opened");

        if let Err(e) = self
            .posts
            .mark_escalated(post.id, record.level, &record.reason)
            .await
        {
            self.failures.record("mark post escalated", &e);
        }

        Some(record)
    }

    /// Conscious re-classification of an existing post; overwrites the
    /// stored level and reason. Returns None for an unknown post.
    pub async fn redetect(&self, post_id: Uuid) -> Option<Classification> {
        let post = match self.posts.get_post(post_id).await {
            Ok(Some(post)) => post,
            Ok(None) => return None,
            Err(e) => {
                self.failures.record("load post for re-detection", &e);
                return None;
            }
        };

        let classification = self.classifier.classify(&post);
        if let Err(e) = self
            .posts
            .overwrite_escalation(post_id, classification.level, &classification.reason)
            .await
        {
            self.failures.record("store re-detection result", &e);
        }
        Some(classification)
    }

    /// Opens a record directly, e.g. from a moderator action. Fails
    /// with `DuplicateEscalation` when the post already has one.
    pub async fn create(
        &self,
        post_id: Uuid,
        level: EscalationLevel,
        reason: String,
        assigned_to: Option<Uuid>,
    ) -> Result<EscalationRecord> {
        let mut record = EscalationRecord::new(post_id, level, reason);
        record.assigned_to = assigned_to;
        self.escalations.create_escalation(&record).await?;

        if let Some(responder) = assigned_to {
            self.notify_assignment(&record, responder).await;
        }
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<EscalationRecord>> {
        self.escalations.get_escalation(id).await
    }

    /// Partial update; unspecified fields are untouched. Returns None
    /// for an unknown id; backward status moves are rejected. Newly
    /// assigning a responder dispatches a critical notification to
    /// them, whatever the escalation's own level.
    pub async fn update(
        &self,
        id: Uuid,
        mut update: EscalationUpdate,
    ) -> Result<Option<EscalationRecord>> {
        let Some(current) = self.escalations.get_escalation(id).await? else {
            return Ok(None);
        };

        if let Some(next) = update.status {
            if next != current.status && !current.status.can_transition_to(next) {
                return Err(HavenError::InvalidTransition {
                    from: current.status.to_string(),
                    to: next.to_string(),
                });
            }
            if next.is_terminal() && update.resolved_at.is_none() {
                update.resolved_at = Some(Some(Utc::now()));
            }
        }

        let previous_assignee = current.assigned_to;
        let Some(updated) = self.escalations.update_escalation(id, &update).await? else {
            return Ok(None);
        };

        if let Some(Some(responder)) = update.assigned_to {
            if previous_assignee != Some(responder) {
                self.notify_assignment(&updated, responder).await;
            }
        }

        Ok(Some(updated))
    }

    /// Open escalations, most severe and oldest first.
    pub async fn open_queue(&self) -> Result<Vec<EscalationRecord>> {
        let mut open = self.escalations.open_escalations().await?;
        let now = Utc::now();
        open.sort_by(|a, b| {
            priority_score(b.level, b.detected_at, now)
                .partial_cmp(&priority_score(a.level, a.detected_at, now))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(open)
    }

    async fn notify_assignment(&self, record: &EscalationRecord, responder: Uuid) {
        let data = serde_json::json!({
            "escalation_id": record.id,
            "post_id": record.post_id,
            "level": record.level.to_string(),
        });
        let receipt = self
            .dispatcher
            .send(
                responder,
                NotificationType::EscalationAssigned,
                "Escalation assigned to you".to_string(),
                format!("A {} escalation needs your attention", record.level),
                Some(data),
            )
            .await;
        if receipt.is_none() {
            tracing::warn!(escalation_id = %record.id, %responder, "assignment notification not dispatched");
        }
    }
}

/// The classifier's level when it produced one; otherwise the reason
/// the post crossed the bar (crisis category or repeated reports).
fn effective_level(post: &Post, classification: &Classification) -> (EscalationLevel, String) {
    if classification.level != EscalationLevel::None {
        return (classification.level, classification.reason.clone());
    }
    if post.category == PostCategory::Crisis {
        return (
            EscalationLevel::High,
            "posted in the crisis category".to_string(),
        );
    }
    (
        EscalationLevel::Medium,
        format!("reported {} times", post.reported_count),
    )
}
