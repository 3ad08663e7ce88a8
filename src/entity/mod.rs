mod escalation;
mod notification;
mod post;

pub use escalation::{EscalationLevel, EscalationRecord, EscalationStatus};
pub use notification::{
    DigestInterval, NotificationEvent, NotificationPreferences, NotificationPriority,
    NotificationType, QuietHours,
};
pub use post::{Post, PostCategory, PostStatus};
