//! Batches pending notifications into summarized groups for periodic
//! digests.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use crate::entity::{DigestInterval, NotificationEvent, NotificationPriority, NotificationType};

pub const DEFAULT_GROUP_WINDOW_MINUTES: i64 = 15;

const DIGEST_DELIVERY_HOUR: u32 = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationGroup {
    /// type + "-" + priority; the grouping key.
    pub key: String,
    pub kind: NotificationType,
    pub priority: NotificationPriority,
    pub count: usize,
    /// Pluralized summary, e.g. "3 new replies".
    pub title: String,
}

/// Groups events from the trailing window by type and priority, in
/// first-seen order.
pub fn group(
    events: &[NotificationEvent],
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Vec<NotificationGroup> {
    let cutoff = now - Duration::minutes(window_minutes);

    let mut groups: Vec<NotificationGroup> = Vec::new();
    for event in events.iter().filter(|e| e.created_at >= cutoff) {
        let key = format!("{}-{}", event.kind, event.priority);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(existing) => existing.count += 1,
            None => groups.push(NotificationGroup {
                key,
                kind: event.kind,
                priority: event.priority,
                count: 1,
                title: String::new(),
            }),
        }
    }

    for group in &mut groups {
        let (singular, plural) = group.kind.digest_label();
        group.title = if group.count == 1 {
            format!("1 {}", singular)
        } else {
            format!("{} {}", group.count, plural)
        };
    }

    groups
}

/// When the next digest should go out.
pub fn next_digest_time(interval: DigestInterval, now: DateTime<Utc>) -> DateTime<Utc> {
    match interval {
        DigestInterval::Hourly => {
            let truncated = Utc
                .with_ymd_and_hms(now.year(), now.month(), now.day(), now.hour(), 0, 0)
                .single()
                .unwrap_or(now);
            truncated + Duration::hours(1)
        }
        DigestInterval::Daily => morning_of(now + Duration::days(1)),
        DigestInterval::Weekly => morning_of(now + Duration::days(7)),
    }
}

fn morning_of(day: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(
        day.year(),
        day.month(),
        day.day(),
        DIGEST_DELIVERY_HOUR,
        0,
        0,
    )
    .single()
    .unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn event(kind: NotificationType, created_at: DateTime<Utc>) -> NotificationEvent {
        let mut e = NotificationEvent::new(
            Uuid::new_v4(),
            kind,
            String::new(),
            String::new(),
            serde_json::Value::Null,
        );
        e.created_at = created_at;
        e
    }

    #[test]
    fn test_group_counts_and_pluralized_titles() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut events = Vec::new();
        for _ in 0..3 {
            events.push(event(NotificationType::NewReply, now - Duration::minutes(5)));
        }
        for _ in 0..2 {
            events.push(event(NotificationType::BadgeEarned, now - Duration::minutes(5)));
        }

        let groups = group(&events, DEFAULT_GROUP_WINDOW_MINUTES, now);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].title, "3 new replies");
        assert_eq!(groups[1].count, 2);
        assert_eq!(groups[1].title, "2 badges earned");
    }

    #[test]
    fn test_group_singular_title() {
        let now = Utc::now();
        let events = vec![event(NotificationType::BadgeEarned, now)];
        let groups = group(&events, DEFAULT_GROUP_WINDOW_MINUTES, now);
        assert_eq!(groups[0].title, "1 badge earned");
    }

    #[test]
    fn test_group_window_excludes_old_events() {
        let now = Utc::now();
        let events = vec![
            event(NotificationType::NewReply, now - Duration::minutes(5)),
            event(NotificationType::NewReply, now - Duration::minutes(60)),
        ];
        let groups = group(&events, DEFAULT_GROUP_WINDOW_MINUTES, now);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 1);
    }

    #[test]
    fn test_group_keys_split_same_type_different_priority() {
        let now = Utc::now();
        let mut escalated = event(NotificationType::System, now);
        escalated.priority = NotificationPriority::High;
        let events = vec![event(NotificationType::System, now), escalated];

        let groups = group(&events, DEFAULT_GROUP_WINDOW_MINUTES, now);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_next_digest_hourly_tops_the_hour() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 37, 12).unwrap();
        let next = next_digest_time(DigestInterval::Hourly, now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_next_digest_daily_nine_next_day() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 37, 12).unwrap();
        let next = next_digest_time(DigestInterval::Daily, now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_next_digest_weekly_seven_days_ahead() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
        let next = next_digest_time(DigestInterval::Weekly, now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 17, 9, 0, 0).unwrap());
    }
}
