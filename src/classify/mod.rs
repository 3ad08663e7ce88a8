//! Escalation classification: configurable rule table plus fixed
//! heuristic checks, and the priority score used to order a
//! responder's queue.

mod rules;

pub use rules::{EscalationRule, RuleSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::{EscalationLevel, Post, PostCategory};
use crate::signal::Lexicon;

/// Minimum rule/heuristic confidence for a post to escalate on its
/// classification alone.
pub const ESCALATION_CONFIDENCE_FLOOR: f64 = 0.5;

/// Reports at or past this count escalate regardless of text signals.
pub const REPORT_COUNT_THRESHOLD: u32 = 3;

const AGE_BONUS_PER_HOUR: f64 = 2.0;
const AGE_BONUS_CAP: f64 = 20.0;
const MIN_INTENSITY_HITS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub level: EscalationLevel,
    pub reason: String,
    pub confidence: f64,
}

impl Classification {
    fn none() -> Self {
        Self {
            level: EscalationLevel::None,
            reason: String::new(),
            confidence: 0.0,
        }
    }
}

pub struct EscalationClassifier {
    rules: RuleSet,
    lexicon: Lexicon,
}

impl EscalationClassifier {
    pub fn new(rules: RuleSet, lexicon: Lexicon) -> Self {
        Self { rules, lexicon }
    }

    /// Scans the rule table in declared order, then the fixed
    /// heuristics; the heuristic result replaces the rule result only
    /// when its confidence is strictly greater. Deterministic for
    /// identical input.
    pub fn classify(&self, post: &Post) -> Classification {
        let text = format!("{} {}", post.title, post.content).to_lowercase();

        let mut best = Classification::none();
        for rule in &self.rules.rules {
            if !rule.categories.is_empty() && !rule.categories.contains(&post.category) {
                continue;
            }
            let denominator = rule.keywords.len() + rule.phrases.len() * 2;
            if denominator == 0 {
                continue;
            }
            let keyword_hits = rule
                .keywords
                .iter()
                .filter(|kw| text.contains(kw.to_lowercase().as_str()))
                .count();
            let phrase_hits = rule
                .phrases
                .iter()
                .filter(|p| text.contains(p.to_lowercase().as_str()))
                .count();
            let weighted = keyword_hits + phrase_hits * 2;
            if weighted == 0 {
                continue;
            }
            let confidence = (weighted as f64 / denominator as f64).clamp(0.0, 1.0);
            // First rule wins ties: only strictly greater replaces.
            if confidence > best.confidence {
                best = Classification {
                    level: rule.level,
                    reason: format!(
                        "matched {} keyword(s) and {} phrase(s) for {} rule",
                        keyword_hits, phrase_hits, rule.level
                    ),
                    confidence,
                };
            }
        }

        if let Some(heuristic) = self.heuristic_check(post, &text) {
            if heuristic.confidence > best.confidence {
                best = heuristic;
            }
        }

        best
    }

    /// Fixed checks in precedence order; the first match ends the scan.
    fn heuristic_check(&self, post: &Post, text: &str) -> Option<Classification> {
        if let Some(phrase) = self
            .lexicon
            .crisis_phrases
            .iter()
            .find(|p| text.contains(p.as_str()))
        {
            return Some(Classification {
                level: EscalationLevel::Critical,
                reason: format!("crisis phrase detected: \"{}\"", phrase),
                confidence: 0.9,
            });
        }

        if let Some(phrase) = self
            .lexicon
            .urgent_phrases
            .iter()
            .find(|p| text.contains(p.as_str()))
        {
            return Some(Classification {
                level: EscalationLevel::High,
                reason: format!("urgent help request: \"{}\"", phrase),
                confidence: 0.7,
            });
        }

        let intensity_hits = self
            .lexicon
            .intensity_words
            .iter()
            .filter(|w| text.contains(w.as_str()))
            .count();
        if intensity_hits >= MIN_INTENSITY_HITS {
            return Some(Classification {
                level: EscalationLevel::High,
                reason: format!("{} high-intensity expressions", intensity_hits),
                confidence: 0.6,
            });
        }

        if post.category == PostCategory::Crisis {
            return Some(Classification {
                level: EscalationLevel::High,
                reason: "posted in the crisis category".to_string(),
                confidence: 0.8,
            });
        }

        None
    }

    /// Whether the post crosses the escalation bar: a confident
    /// classification, the crisis category, or repeated reports.
    pub fn should_escalate(&self, post: &Post) -> bool {
        let classification = self.classify(post);
        (classification.confidence >= ESCALATION_CONFIDENCE_FLOOR
            && classification.level != EscalationLevel::None)
            || post.category == PostCategory::Crisis
            || post.reported_count >= REPORT_COUNT_THRESHOLD
    }
}

impl Default for EscalationClassifier {
    fn default() -> Self {
        Self::new(RuleSet::default(), Lexicon::default())
    }
}

/// Orders a responder's queue: level weight plus an age bonus of two
/// points per hour, capped at twenty.
pub fn priority_score(level: EscalationLevel, detected_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - detected_at).num_seconds().max(0) as f64 / 3600.0;
    level.base_weight() + (hours * AGE_BONUS_PER_HOUR).min(AGE_BONUS_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn post(category: PostCategory, title: &str, content: &str) -> Post {
        Post::new(Uuid::new_v4(), category, title.to_string(), content.to_string())
    }

    fn classifier() -> EscalationClassifier {
        EscalationClassifier::default()
    }

    #[test]
    fn test_crisis_phrase_is_critical_in_any_category() {
        for category in [
            PostCategory::Academic,
            PostCategory::Relationships,
            PostCategory::General,
        ] {
            let result = classifier().classify(&post(
                category,
                "I give up",
                "I want to kill myself, nothing matters anymore",
            ));
            assert_eq!(result.level, EscalationLevel::Critical);
            assert!(result.confidence >= 0.9);
            assert!(!result.reason.is_empty());
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let p = post(
            PostCategory::MentalHealth,
            "struggling badly",
            "I feel hopeless and worthless, can't cope with anything",
        );
        let first = classifier().classify(&p);
        let second = classifier().classify(&p);
        assert_eq!(first, second);
    }

    #[test]
    fn test_urgent_phrase_is_high() {
        let result = classifier().classify(&post(
            PostCategory::General,
            "please help",
            "I don't know who else to ask",
        ));
        assert_eq!(result.level, EscalationLevel::High);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_three_intensity_words_is_high() {
        let result = classifier().classify(&post(
            PostCategory::Academic,
            "Panic before exam",
            "I'm having anxiety and panic attacks, my deadline is tomorrow and I feel hopeless",
        ));
        assert!(result.level >= EscalationLevel::Medium);
        assert!(!result.reason.is_empty());
    }

    #[test]
    fn test_crisis_category_alone_is_high() {
        let result = classifier().classify(&post(
            PostCategory::Crisis,
            "checking in",
            "not sure where this belongs",
        ));
        assert_eq!(result.level, EscalationLevel::High);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_no_signal_is_none_with_zero_confidence() {
        let result = classifier().classify(&post(
            PostCategory::General,
            "study group",
            "meeting in the library on tuesdays",
        ));
        assert_eq!(result.level, EscalationLevel::None);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reason.is_empty());
    }

    #[test]
    fn test_first_rule_wins_on_equal_confidence() {
        // Two rules with a single keyword each reach confidence 1.0 on
        // the same text; the earlier one must win.
        let rules = RuleSet {
            rules: vec![
                EscalationRule {
                    categories: Vec::new(),
                    keywords: vec!["overwhelmed".to_string()],
                    phrases: Vec::new(),
                    level: EscalationLevel::Medium,
                },
                EscalationRule {
                    categories: Vec::new(),
                    keywords: vec!["overwhelmed".to_string()],
                    phrases: Vec::new(),
                    level: EscalationLevel::High,
                },
            ],
        };
        let classifier = EscalationClassifier::new(
            rules,
            Lexicon {
                crisis_phrases: Vec::new(),
                urgent_phrases: Vec::new(),
                intensity_words: Vec::new(),
                ..Lexicon::default()
            },
        );
        let result = classifier.classify(&post(
            PostCategory::General,
            "overwhelmed",
            "completely overwhelmed",
        ));
        assert_eq!(result.level, EscalationLevel::Medium);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_rule_category_filter_skips() {
        let rules = RuleSet {
            rules: vec![EscalationRule {
                categories: vec![PostCategory::Academic],
                keywords: vec!["failing".to_string()],
                phrases: Vec::new(),
                level: EscalationLevel::Medium,
            }],
        };
        let classifier = EscalationClassifier::new(
            rules,
            Lexicon {
                crisis_phrases: Vec::new(),
                urgent_phrases: Vec::new(),
                intensity_words: Vec::new(),
                ..Lexicon::default()
            },
        );
        let result = classifier.classify(&post(
            PostCategory::Relationships,
            "failing at everything",
            "",
        ));
        assert_eq!(result.level, EscalationLevel::None);
    }

    #[test]
    fn test_phrase_hits_weighted_double() {
        let rules = RuleSet {
            rules: vec![EscalationRule {
                categories: Vec::new(),
                keywords: vec!["absent".to_string(), "missing".to_string()],
                phrases: vec!["can't cope".to_string()],
                level: EscalationLevel::High,
            }],
        };
        let classifier = EscalationClassifier::new(
            rules,
            Lexicon {
                crisis_phrases: Vec::new(),
                urgent_phrases: Vec::new(),
                intensity_words: Vec::new(),
                ..Lexicon::default()
            },
        );
        // Phrase hit only: 2 of a possible 4 -> 0.5.
        let result = classifier.classify(&post(PostCategory::General, "", "I can't cope today"));
        assert_eq!(result.level, EscalationLevel::High);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_should_escalate_on_reported_count() {
        let mut p = post(PostCategory::General, "ordinary", "nothing alarming here");
        assert!(!classifier().should_escalate(&p));
        p.reported_count = 3;
        assert!(classifier().should_escalate(&p));
    }

    #[test]
    fn test_should_escalate_on_crisis_category() {
        let p = post(PostCategory::Crisis, "hi", "just saying hi");
        assert!(classifier().should_escalate(&p));
    }

    #[test]
    fn test_priority_score_base_and_age_bonus() {
        let now = Utc::now();
        let fresh = priority_score(EscalationLevel::Critical, now, now);
        assert!((fresh - 100.0).abs() < 1e-6);

        let ten_hours = priority_score(EscalationLevel::Critical, now - Duration::hours(10), now);
        assert!((ten_hours - 120.0).abs() < 1e-6);

        // Bonus caps at 20.
        let ancient = priority_score(EscalationLevel::Critical, now - Duration::hours(500), now);
        assert!((ancient - 120.0).abs() < 1e-6);

        let medium = priority_score(EscalationLevel::Medium, now, now);
        assert!((medium - 50.0).abs() < 1e-6);
    }
}
