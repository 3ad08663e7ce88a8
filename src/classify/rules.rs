//! Operator-editable escalation rule table.
//!
//! Rules are scanned in declared order and the order is load-bearing:
//! on equal confidence the earlier rule wins. Loaded once at
//! construction, never mutated at runtime.

use serde::{Deserialize, Serialize};

use crate::entity::{EscalationLevel, PostCategory};
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Empty list applies the rule to every category.
    #[serde(default)]
    pub categories: Vec<PostCategory>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
    pub level: EscalationLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<EscalationRule>,
}

impl RuleSet {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: vec![
                EscalationRule {
                    categories: Vec::new(),
                    keywords: strings(&["suicide", "suicidal", "overdose", "self-harm"]),
                    phrases: strings(&[
                        "kill myself",
                        "end my life",
                        "want to die",
                        "hurt myself",
                        "better off dead",
                    ]),
                    level: EscalationLevel::Critical,
                },
                EscalationRule {
                    categories: vec![PostCategory::MentalHealth, PostCategory::Crisis],
                    keywords: strings(&["hopeless", "worthless", "panic", "breakdown"]),
                    phrases: strings(&["can't cope", "no way out", "falling apart"]),
                    level: EscalationLevel::High,
                },
                EscalationRule {
                    categories: Vec::new(),
                    keywords: strings(&[
                        "anxiety",
                        "anxious",
                        "depressed",
                        "overwhelmed",
                        "scared",
                        "struggling",
                    ]),
                    phrases: Vec::new(),
                    level: EscalationLevel::Medium,
                },
                EscalationRule {
                    categories: Vec::new(),
                    keywords: strings(&["stressed", "worried", "tired", "sad"]),
                    phrases: Vec::new(),
                    level: EscalationLevel::Low,
                },
            ],
        }
    }
}
