use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
    Critical,
}

impl NotificationPriority {
    /// Fixed weight used for threshold comparisons.
    pub fn weight(&self) -> u8 {
        match self {
            NotificationPriority::Critical => 5,
            NotificationPriority::Urgent => 4,
            NotificationPriority::High => 3,
            NotificationPriority::Normal => 2,
            NotificationPriority::Low => 1,
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationPriority::Low => write!(f, "low"),
            NotificationPriority::Normal => write!(f, "normal"),
            NotificationPriority::High => write!(f, "high"),
            NotificationPriority::Urgent => write!(f, "urgent"),
            NotificationPriority::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for NotificationPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(NotificationPriority::Low),
            "normal" => Ok(NotificationPriority::Normal),
            "high" => Ok(NotificationPriority::High),
            "urgent" => Ok(NotificationPriority::Urgent),
            "critical" => Ok(NotificationPriority::Critical),
            _ => Err(format!("Invalid notification priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    EscalationAssigned,
    EscalationResolved,
    #[serde(rename = "meeting-reminder-1h")]
    MeetingReminder1h,
    #[serde(rename = "meeting-reminder-24h")]
    MeetingReminder24h,
    NewReply,
    BadgeEarned,
    PostUpdated,
    System,
}

impl NotificationType {
    /// Every type maps to exactly one priority.
    pub fn priority(&self) -> NotificationPriority {
        match self {
            NotificationType::EscalationAssigned => NotificationPriority::Critical,
            NotificationType::EscalationResolved => NotificationPriority::High,
            NotificationType::MeetingReminder1h => NotificationPriority::Urgent,
            NotificationType::MeetingReminder24h => NotificationPriority::Normal,
            NotificationType::NewReply => NotificationPriority::Normal,
            NotificationType::BadgeEarned => NotificationPriority::Low,
            NotificationType::PostUpdated => NotificationPriority::Low,
            NotificationType::System => NotificationPriority::Normal,
        }
    }

    /// Digest title templates: (singular, plural).
    pub fn digest_label(&self) -> (&'static str, &'static str) {
        match self {
            NotificationType::EscalationAssigned => ("escalation assigned", "escalations assigned"),
            NotificationType::EscalationResolved => ("escalation resolved", "escalations resolved"),
            NotificationType::MeetingReminder1h | NotificationType::MeetingReminder24h => {
                ("meeting reminder", "meeting reminders")
            }
            NotificationType::NewReply => ("new reply", "new replies"),
            NotificationType::BadgeEarned => ("badge earned", "badges earned"),
            NotificationType::PostUpdated => ("post updated", "posts updated"),
            NotificationType::System => ("system notice", "system notices"),
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::EscalationAssigned => write!(f, "escalation-assigned"),
            NotificationType::EscalationResolved => write!(f, "escalation-resolved"),
            NotificationType::MeetingReminder1h => write!(f, "meeting-reminder-1h"),
            NotificationType::MeetingReminder24h => write!(f, "meeting-reminder-24h"),
            NotificationType::NewReply => write!(f, "new-reply"),
            NotificationType::BadgeEarned => write!(f, "badge-earned"),
            NotificationType::PostUpdated => write!(f, "post-updated"),
            NotificationType::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "escalation-assigned" => Ok(NotificationType::EscalationAssigned),
            "escalation-resolved" => Ok(NotificationType::EscalationResolved),
            "meeting-reminder-1h" => Ok(NotificationType::MeetingReminder1h),
            "meeting-reminder-24h" => Ok(NotificationType::MeetingReminder24h),
            "new-reply" => Ok(NotificationType::NewReply),
            "badge-earned" => Ok(NotificationType::BadgeEarned),
            "post-updated" => Ok(NotificationType::PostUpdated),
            "system" => Ok(NotificationType::System),
            _ => Err(format!("Invalid notification type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub priority: NotificationPriority,
    /// True when delivery was deferred past creation time.
    pub scheduled: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(
        user_id: Uuid,
        kind: NotificationType,
        title: String,
        body: String,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title,
            body,
            data,
            priority: kind.priority(),
            scheduled: false,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: 22,
            end_hour: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DigestInterval {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl std::fmt::Display for DigestInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestInterval::Hourly => write!(f, "hourly"),
            DigestInterval::Daily => write!(f, "daily"),
            DigestInterval::Weekly => write!(f, "weekly"),
        }
    }
}

impl std::str::FromStr for DigestInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hourly" => Ok(DigestInterval::Hourly),
            "daily" => Ok(DigestInterval::Daily),
            "weekly" => Ok(DigestInterval::Weekly),
            _ => Err(format!("Invalid digest interval: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub quiet_hours: QuietHours,
    pub priority_threshold: NotificationPriority,
    pub grouping_enabled: bool,
    pub smart_timing_enabled: bool,
    pub digest_enabled: bool,
    pub digest_interval: DigestInterval,
}

impl NotificationPreferences {
    /// Defaults applied for users who never saved preferences.
    pub fn default_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            quiet_hours: QuietHours::default(),
            priority_threshold: NotificationPriority::Normal,
            grouping_enabled: true,
            smart_timing_enabled: true,
            digest_enabled: false,
            digest_interval: DigestInterval::Daily,
        }
    }
}
