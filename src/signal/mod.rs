//! Pure text-signal extraction: category scoring, sentiment, keywords.
//!
//! Everything here is synchronous and side-effect-free. Malformed or
//! empty text never fails; it falls back to conservative defaults.

mod lexicon;

pub use lexicon::{CategoryLexicon, Lexicon, TopicLexicon};

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::entity::PostCategory;

const MAX_KEYWORDS: usize = 15;
const MAX_MATCHED_KEYWORDS: usize = 10;
const MAX_PHRASES: usize = 10;
const MAX_ALTERNATIVES: usize = 3;
const CURRENT_CATEGORY_BOOST: f64 = 1.2;
const MIN_TOKEN_LEN: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub category: PostCategory,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGuess {
    pub category: PostCategory,
    pub confidence: f64,
    pub alternatives: Vec<CategoryScore>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Crisis,
    Negative,
    Neutral,
    Positive,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentReading {
    pub sentiment: Sentiment,
    /// In [-1, 1]; crisis pins to -1.
    pub score: f64,
    pub confidence: f64,
    pub emotions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordSummary {
    pub keywords: Vec<String>,
    pub important_phrases: Vec<String>,
    pub topics: Vec<String>,
}

pub struct SignalExtractor {
    lexicon: Lexicon,
}

impl SignalExtractor {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Guess a category from keyword-occurrence scores. The author's
    /// current category gets a small inertia boost when it scores at
    /// all; with no signal anywhere, confidence settles at 0.5.
    pub fn categorize(
        &self,
        title: &str,
        content: &str,
        current: Option<PostCategory>,
    ) -> CategoryGuess {
        let text = combined(title, content);

        let mut scores: Vec<(PostCategory, f64)> = Vec::with_capacity(self.lexicon.categories.len());
        for entry in &self.lexicon.categories {
            let count: usize = entry
                .keywords
                .iter()
                .map(|kw| text.matches(kw.as_str()).count())
                .sum();
            let mut score = count as f64 * entry.weight;
            if score > 0.0 && current == Some(entry.category) {
                score *= CURRENT_CATEGORY_BOOST;
            }
            scores.push((entry.category, score));
        }

        let total: f64 = scores.iter().map(|(_, s)| s).sum();
        if total == 0.0 {
            return CategoryGuess {
                category: current.unwrap_or_default(),
                confidence: 0.5,
                alternatives: Vec::new(),
                keywords: Vec::new(),
            };
        }

        // First entry wins ties: only a strictly greater score replaces.
        let mut best = scores[0];
        for &(category, score) in &scores[1..] {
            if score > best.1 {
                best = (category, score);
            }
        }

        let mut rest: Vec<(PostCategory, f64)> = scores
            .iter()
            .filter(|(category, score)| *category != best.0 && *score > 0.0)
            .copied()
            .collect();
        rest.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let alternatives = rest
            .into_iter()
            .take(MAX_ALTERNATIVES)
            .map(|(category, score)| CategoryScore {
                category,
                confidence: score / total,
            })
            .collect();

        let keywords = self
            .lexicon
            .categories
            .iter()
            .find(|entry| entry.category == best.0)
            .map(|entry| {
                entry
                    .keywords
                    .iter()
                    .filter(|kw| text.contains(kw.as_str()))
                    .take(MAX_MATCHED_KEYWORDS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        CategoryGuess {
            category: best.0,
            confidence: best.1 / total,
            alternatives,
            keywords,
        }
    }

    /// Sentiment from word counts. Any crisis phrase short-circuits to
    /// a crisis reading regardless of every other signal.
    pub fn detect_sentiment(&self, title: &str, content: &str) -> SentimentReading {
        let text = combined(title, content);

        if self
            .lexicon
            .crisis_phrases
            .iter()
            .any(|p| text.contains(p.as_str()))
        {
            return SentimentReading {
                sentiment: Sentiment::Crisis,
                score: -1.0,
                confidence: 1.0,
                emotions: vec![
                    "crisis".to_string(),
                    "despair".to_string(),
                    "hopelessness".to_string(),
                ],
            };
        }

        let tokens: Vec<String> = text
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| !t.is_empty())
            .collect();
        let total_words = tokens.len();

        let positive = tokens
            .iter()
            .filter(|t| self.lexicon.positive_words.iter().any(|w| w == *t))
            .count();
        let negative = tokens
            .iter()
            .filter(|t| self.lexicon.negative_words.iter().any(|w| w == *t))
            .count();

        let (sentiment, score) = if negative > positive {
            (Sentiment::Negative, -((negative as f64 / 10.0).min(1.0)))
        } else if positive > negative {
            (Sentiment::Positive, (positive as f64 / 10.0).min(1.0))
        } else {
            (Sentiment::Neutral, 0.0)
        };

        let matched = (positive + negative) as f64;
        let confidence = (matched / (total_words as f64 / 20.0).max(1.0)).min(1.0);

        SentimentReading {
            sentiment,
            score,
            confidence,
            emotions: Vec::new(),
        }
    }

    /// Frequency-ranked keywords, repeated 2/3-gram phrases, and topic
    /// tags from the fixed topic table.
    pub fn extract_keywords(&self, title: &str, content: &str) -> KeywordSummary {
        let text = combined(title, content);

        let raw_tokens: Vec<String> = text
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| !t.is_empty())
            .collect();

        let title_tokens: HashSet<String> = title
            .to_lowercase()
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| self.passes_filter(t))
            .collect();

        // Count in first-seen order so equal frequencies rank by
        // position in the text.
        let mut order: Vec<&str> = Vec::new();
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for token in raw_tokens.iter().filter(|t| self.passes_filter(t)) {
            let count = freq.entry(token.as_str()).or_insert(0);
            if *count == 0 {
                order.push(token.as_str());
            }
            *count += 1;
        }

        let mut ranked: Vec<(&str, usize)> = order
            .iter()
            .map(|t| (*t, freq[t]))
            .filter(|(t, n)| *n >= 2 || title_tokens.contains(*t))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let keywords = ranked
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|(t, _)| t.to_string())
            .collect();

        let important_phrases = self.repeated_phrases(&raw_tokens);

        let topics = self
            .lexicon
            .topics
            .iter()
            .filter(|topic| topic.keywords.iter().any(|kw| text.contains(kw.as_str())))
            .map(|topic| topic.name.clone())
            .collect();

        KeywordSummary {
            keywords,
            important_phrases,
            topics,
        }
    }

    fn passes_filter(&self, token: &str) -> bool {
        token.len() >= MIN_TOKEN_LEN && !self.lexicon.is_stop_word(token)
    }

    /// 2- and 3-grams over the raw token sequence whose every word
    /// survives the stop-word filter and which occur at least twice.
    fn repeated_phrases(&self, tokens: &[String]) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        let mut freq: HashMap<String, usize> = HashMap::new();

        for n in [2usize, 3] {
            if tokens.len() < n {
                continue;
            }
            for window in tokens.windows(n) {
                if !window.iter().all(|t| self.passes_filter(t)) {
                    continue;
                }
                let phrase = window.join(" ");
                let count = freq.entry(phrase.clone()).or_insert(0);
                if *count == 0 {
                    order.push(phrase);
                }
                *count += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = order
            .into_iter()
            .map(|p| {
                let n = freq[&p];
                (p, n)
            })
            .filter(|(_, n)| *n >= 2)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(MAX_PHRASES)
            .map(|(p, _)| p)
            .collect()
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

fn combined(title: &str, content: &str) -> String {
    format!("{} {}", title, content).to_lowercase()
}

/// Lowercased token with every non-alphanumeric character stripped.
fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}
