use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use haven::classify::EscalationClassifier;
use haven::entity::{
    EscalationLevel, EscalationStatus, NotificationEvent, NotificationPreferences,
    NotificationPriority, NotificationType, Post, PostCategory, PostStatus,
};
use haven::error::{HavenError, Result};
use haven::escalation::EscalationManager;
use haven::notify::Dispatcher;
use haven::signal::SignalExtractor;
use haven::sink::RecordingSink;
use haven::store::{
    EscalationUpdate, MemoryStore, NotificationStore, PostStore, RecordingPush,
};

struct Fixture {
    store: Arc<MemoryStore>,
    push: Arc<RecordingPush>,
    dispatcher: Arc<Dispatcher>,
    manager: EscalationManager,
    sink: Arc<RecordingSink>,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let push = Arc::new(RecordingPush::new());
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Arc::new(
        Dispatcher::new(store.clone(), store.clone(), push.clone())
            .with_failure_sink(sink.clone()),
    );
    let manager = EscalationManager::new(
        EscalationClassifier::default(),
        store.clone(),
        store.clone(),
        dispatcher.clone(),
    )
    .with_failure_sink(sink.clone());

    Fixture {
        store,
        push,
        dispatcher,
        manager,
        sink,
    }
}

fn post(category: PostCategory, title: &str, content: &str) -> Post {
    Post::new(
        Uuid::new_v4(),
        category,
        title.to_string(),
        content.to_string(),
    )
}

fn midday() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

fn late_night() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 23, 0, 0).unwrap()
}

#[tokio::test]
async fn test_crisis_post_escalates_and_notifies_responder() {
    let f = fixture();
    let p = post(
        PostCategory::General,
        "I give up",
        "I want to kill myself, there is no reason to live",
    );
    f.store.insert_post(p.clone());

    let record = f.manager.process_new_post(&p).await.expect("escalation");
    assert_eq!(record.level, EscalationLevel::Critical);
    assert_eq!(record.status, EscalationStatus::Pending);

    let stored = f.store.get_post(p.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Escalated);
    assert_eq!(stored.escalation_level, Some(EscalationLevel::Critical));

    // Assigning a responder dispatches a critical notification to them
    // immediately, even though assignment is independent of the level.
    let responder = Uuid::new_v4();
    f.store.set_push_token(responder, "token-1".to_string());
    let update = EscalationUpdate {
        assigned_to: Some(Some(responder)),
        ..Default::default()
    };
    let updated = f.manager.update(record.id, update).await.unwrap().unwrap();
    assert_eq!(updated.assigned_to, Some(responder));

    let pushed = f.push.messages();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].token, "token-1");
    assert_eq!(pushed[0].priority, NotificationPriority::Critical);
    assert!(f.sink.entries().is_empty());
}

#[tokio::test]
async fn test_exam_panic_post_flows_through_extractor_and_classifier() {
    let f = fixture();
    let p = post(
        PostCategory::Academic,
        "Panic before exam",
        "I'm having anxiety and panic attacks, my deadline is tomorrow and I feel hopeless",
    );
    f.store.insert_post(p.clone());

    let extractor = SignalExtractor::default();
    let guess = extractor.categorize(&p.title, &p.content, Some(p.category));
    assert!(
        guess.category == PostCategory::MentalHealth || guess.category == PostCategory::Academic
    );
    assert!(guess.confidence > 0.0);

    let record = f.manager.process_new_post(&p).await.expect("escalation");
    assert!(record.level >= EscalationLevel::Medium);
    assert!(!record.reason.is_empty());
}

#[tokio::test]
async fn test_duplicate_escalation_race_yields_single_record() {
    let f = fixture();
    let p = post(PostCategory::Crisis, "need to talk", "everything is falling apart");
    f.store.insert_post(p.clone());

    let first = f.manager.process_new_post(&p).await;
    let second = f.manager.process_new_post(&p).await;
    assert!(first.is_some());
    assert!(second.is_none());
}

#[tokio::test]
async fn test_quiet_hours_defer_and_cancel() {
    let f = fixture();
    let user = Uuid::new_v4();
    f.store.set_push_token(user, "token-2".to_string());

    let receipt = f
        .dispatcher
        .send_at(
            user,
            NotificationType::NewReply,
            "New reply".to_string(),
            "Someone replied".to_string(),
            None,
            late_night(),
        )
        .await
        .expect("receipt");

    assert!(receipt.scheduled);
    assert_eq!(f.dispatcher.pending_deliveries(), 1);
    assert!(f.push.messages().is_empty());

    let stored = f.store.notification(receipt.notification_id).unwrap();
    assert!(stored.scheduled);

    // Cancellation is only possible before the timer fires.
    assert!(f.dispatcher.cancel_scheduled(receipt.notification_id));
    assert!(!f.dispatcher.cancel_scheduled(receipt.notification_id));
}

#[tokio::test]
async fn test_below_threshold_is_silently_filtered() {
    let f = fixture();
    let user = Uuid::new_v4();
    let mut prefs = NotificationPreferences::default_for(user);
    prefs.priority_threshold = NotificationPriority::High;
    f.store.set_preferences(prefs);

    let receipt = f
        .dispatcher
        .send_at(
            user,
            NotificationType::NewReply,
            "New reply".to_string(),
            String::new(),
            None,
            midday(),
        )
        .await;

    assert!(receipt.is_none());
    assert_eq!(f.store.notification_count(), 0);
    assert!(f.push.messages().is_empty());
}

#[tokio::test]
async fn test_digest_summarizes_unread_events() {
    let f = fixture();
    let user = Uuid::new_v4();
    f.store.set_push_token(user, "token-3".to_string());
    let now = midday();

    for _ in 0..3 {
        let mut event = NotificationEvent::new(
            user,
            NotificationType::NewReply,
            "New reply".to_string(),
            String::new(),
            serde_json::Value::Null,
        );
        event.created_at = now - chrono::Duration::minutes(10);
        f.store.create_notification(&event).await.unwrap();
    }
    for _ in 0..2 {
        let mut event = NotificationEvent::new(
            user,
            NotificationType::BadgeEarned,
            "Badge earned".to_string(),
            String::new(),
            serde_json::Value::Null,
        );
        event.created_at = now - chrono::Duration::minutes(10);
        f.store.create_notification(&event).await.unwrap();
    }

    let receipt = f.dispatcher.build_digest_at(user, now).await.expect("digest");
    assert!(!receipt.scheduled);

    let digest = f.store.notification(receipt.notification_id).unwrap();
    assert_eq!(digest.kind, NotificationType::System);
    assert!(digest.body.contains("3 new replies"));
    assert!(digest.body.contains("2 badges earned"));
    assert_eq!(digest.data["total"], 5);

    let pushed = f.push.messages();
    assert_eq!(pushed.len(), 1);
    assert!(pushed[0].body.contains("3 new replies"));
}

#[tokio::test]
async fn test_backward_transition_rejected_and_resolution_stamped() {
    let f = fixture();
    let record = f
        .manager
        .create(Uuid::new_v4(), EscalationLevel::High, "manual".to_string(), None)
        .await
        .unwrap();

    let update = EscalationUpdate {
        status: Some(EscalationStatus::Resolved),
        ..Default::default()
    };
    let resolved = f.manager.update(record.id, update).await.unwrap().unwrap();
    assert_eq!(resolved.status, EscalationStatus::Resolved);
    assert!(resolved.resolved_at.is_some());

    let backward = EscalationUpdate {
        status: Some(EscalationStatus::InProgress),
        ..Default::default()
    };
    let err = f.manager.update(record.id, backward).await.unwrap_err();
    assert!(matches!(err, HavenError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_open_queue_orders_by_severity_then_age() {
    let f = fixture();
    let low = f
        .manager
        .create(Uuid::new_v4(), EscalationLevel::Low, "low".to_string(), None)
        .await
        .unwrap();
    let critical = f
        .manager
        .create(Uuid::new_v4(), EscalationLevel::Critical, "crit".to_string(), None)
        .await
        .unwrap();

    let queue = f.manager.open_queue().await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].id, critical.id);
    assert_eq!(queue[1].id, low.id);
}

/// Store that fails every write, for observing degraded dispatch.
struct FailingNotifications;

#[async_trait]
impl NotificationStore for FailingNotifications {
    async fn create_notification(&self, _event: &NotificationEvent) -> Result<()> {
        Err(HavenError::Storage("disk full".to_string()))
    }

    async fn unread_notifications(&self, _user_id: Uuid) -> Result<Vec<NotificationEvent>> {
        Err(HavenError::Storage("disk full".to_string()))
    }

    async fn mark_read(&self, _id: Uuid) -> Result<bool> {
        Err(HavenError::Storage("disk full".to_string()))
    }

    async fn mark_delivered(&self, _id: Uuid) -> Result<bool> {
        Err(HavenError::Storage("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_persistence_failure_degrades_without_raising() {
    let store = Arc::new(MemoryStore::new());
    let push = Arc::new(RecordingPush::new());
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Dispatcher::new(
        Arc::new(FailingNotifications),
        store.clone(),
        push.clone(),
    )
    .with_failure_sink(sink.clone());

    let receipt = dispatcher
        .send_at(
            Uuid::new_v4(),
            NotificationType::NewReply,
            "New reply".to_string(),
            String::new(),
            None,
            midday(),
        )
        .await;

    assert!(receipt.is_none());
    assert!(push.messages().is_empty());
    let failures = sink.entries();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "persist notification");
}
