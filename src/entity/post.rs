use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EscalationLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PostCategory {
    MentalHealth,
    Relationships,
    Academic,
    Crisis,
    SubstanceAbuse,
    SexualHealth,
    #[default]
    General,
}

impl std::fmt::Display for PostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostCategory::MentalHealth => write!(f, "mental-health"),
            PostCategory::Relationships => write!(f, "relationships"),
            PostCategory::Academic => write!(f, "academic"),
            PostCategory::Crisis => write!(f, "crisis"),
            PostCategory::SubstanceAbuse => write!(f, "substance-abuse"),
            PostCategory::SexualHealth => write!(f, "sexual-health"),
            PostCategory::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for PostCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "mental-health" => Ok(PostCategory::MentalHealth),
            "relationships" => Ok(PostCategory::Relationships),
            "academic" => Ok(PostCategory::Academic),
            "crisis" => Ok(PostCategory::Crisis),
            "substance-abuse" => Ok(PostCategory::SubstanceAbuse),
            "sexual-health" => Ok(PostCategory::SexualHealth),
            "general" => Ok(PostCategory::General),
            _ => Err(format!("Invalid post category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Active,
    Escalated,
    Removed,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStatus::Active => write!(f, "active"),
            PostStatus::Escalated => write!(f, "escalated"),
            PostStatus::Removed => write!(f, "removed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category: PostCategory,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub escalation_level: Option<EscalationLevel>,
    pub escalation_reason: Option<String>,
    pub reported_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, category: PostCategory, title: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            category,
            title,
            content,
            status: PostStatus::default(),
            escalation_level: None,
            escalation_reason: None,
            reported_count: 0,
            created_at: Utc::now(),
        }
    }
}
