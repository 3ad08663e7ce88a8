//! Priority threshold, quiet-hours, and smart-timing arithmetic.
//!
//! Pure functions over an explicit `now` so every branch is testable
//! at any hour.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use crate::entity::{NotificationPreferences, NotificationPriority};

const DAYTIME_LOW_DELAY_MIN: i64 = 5;
const EVENING_DELAY_MIN: i64 = 10;

pub fn should_send(priority: NotificationPriority, prefs: &NotificationPreferences) -> bool {
    priority.weight() >= prefs.priority_threshold.weight()
}

/// Quiet iff the current hour falls in the configured window; a start
/// hour past the end hour wraps midnight.
pub fn is_quiet_hours(prefs: &NotificationPreferences, now: DateTime<Utc>) -> bool {
    let quiet = prefs.quiet_hours;
    if !quiet.enabled {
        return false;
    }
    let hour = now.hour();
    if quiet.start_hour > quiet.end_hour {
        hour >= quiet.start_hour || hour < quiet.end_hour
    } else {
        hour >= quiet.start_hour && hour < quiet.end_hour
    }
}

/// How long to hold a notification back. Critical and urgent are never
/// delayed, quiet hours defer everything else to the end of the
/// window, and outside quiet hours soft time-of-day heuristics apply.
pub fn smart_delay(
    priority: NotificationPriority,
    prefs: &NotificationPreferences,
    now: DateTime<Utc>,
) -> Duration {
    if matches!(
        priority,
        NotificationPriority::Critical | NotificationPriority::Urgent
    ) {
        return Duration::zero();
    }

    if is_quiet_hours(prefs, now) {
        return until_hour(prefs.quiet_hours.end_hour, now);
    }

    if !prefs.smart_timing_enabled {
        return Duration::zero();
    }

    let hour = now.hour();
    match priority {
        NotificationPriority::Low if (9..17).contains(&hour) => {
            Duration::minutes(DAYTIME_LOW_DELAY_MIN)
        }
        NotificationPriority::Normal | NotificationPriority::Low if (18..22).contains(&hour) => {
            Duration::minutes(EVENING_DELAY_MIN)
        }
        _ => Duration::zero(),
    }
}

/// Seconds until the next occurrence of `hour`:00, rolling to the next
/// day when it has already passed.
fn until_hour(hour: u32, now: DateTime<Utc>) -> Duration {
    let Some(naive) = now.date_naive().and_hms_opt(hour % 24, 0, 0) else {
        return Duration::zero();
    };
    let mut target = Utc.from_utc_datetime(&naive);
    if target <= now {
        target += Duration::days(1);
    }
    target - now
}
