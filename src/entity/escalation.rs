use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationLevel {
    /// Base weight for ordering a responder's queue.
    pub fn base_weight(&self) -> f64 {
        match self {
            EscalationLevel::Critical => 100.0,
            EscalationLevel::High => 75.0,
            EscalationLevel::Medium => 50.0,
            EscalationLevel::Low => 25.0,
            EscalationLevel::None => 0.0,
        }
    }
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationLevel::None => write!(f, "none"),
            EscalationLevel::Low => write!(f, "low"),
            EscalationLevel::Medium => write!(f, "medium"),
            EscalationLevel::High => write!(f, "high"),
            EscalationLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for EscalationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(EscalationLevel::None),
            "low" => Ok(EscalationLevel::Low),
            "medium" => Ok(EscalationLevel::Medium),
            "high" => Ok(EscalationLevel::High),
            "critical" => Ok(EscalationLevel::Critical),
            _ => Err(format!("Invalid escalation level: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Dismissed,
}

impl EscalationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EscalationStatus::Resolved | EscalationStatus::Dismissed)
    }

    /// Status only moves forward; resolved and dismissed accept nothing.
    pub fn can_transition_to(&self, next: EscalationStatus) -> bool {
        match self {
            EscalationStatus::Pending => next != EscalationStatus::Pending,
            EscalationStatus::InProgress => next.is_terminal(),
            EscalationStatus::Resolved | EscalationStatus::Dismissed => false,
        }
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationStatus::Pending => write!(f, "pending"),
            EscalationStatus::InProgress => write!(f, "in-progress"),
            EscalationStatus::Resolved => write!(f, "resolved"),
            EscalationStatus::Dismissed => write!(f, "dismissed"),
        }
    }
}

impl std::str::FromStr for EscalationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(EscalationStatus::Pending),
            "in-progress" | "inprogress" => Ok(EscalationStatus::InProgress),
            "resolved" => Ok(EscalationStatus::Resolved),
            "dismissed" => Ok(EscalationStatus::Dismissed),
            _ => Err(format!("Invalid escalation status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub level: EscalationLevel,
    pub reason: String,
    pub detected_at: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub status: EscalationStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl EscalationRecord {
    pub fn new(post_id: Uuid, level: EscalationLevel, reason: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            level,
            reason,
            detected_at: Utc::now(),
            assigned_to: None,
            status: EscalationStatus::default(),
            resolved_at: None,
            notes: None,
        }
    }
}
