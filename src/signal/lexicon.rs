//! Keyword tables driving signal extraction and the classifier
//! heuristics. Operator-editable data: a built-in default table plus
//! YAML loading for deployments that tune the vocabulary.

use serde::{Deserialize, Serialize};

use crate::entity::PostCategory;
use crate::error::Result;

fn default_weight() -> f64 {
    1.0
}

/// Keyword list scored for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLexicon {
    pub category: PostCategory,
    pub keywords: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Keyword list naming one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicLexicon {
    pub name: String,
    pub keywords: Vec<String>,
}

/// The full vocabulary. Loaded once and never mutated at runtime;
/// list order is significant (first entry wins score ties).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub categories: Vec<CategoryLexicon>,
    pub crisis_phrases: Vec<String>,
    pub urgent_phrases: Vec<String>,
    pub intensity_words: Vec<String>,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    pub stop_words: Vec<String>,
    pub topics: Vec<TopicLexicon>,
}

impl Lexicon {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|w| w == word)
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryLexicon {
                    category: PostCategory::Crisis,
                    keywords: strings(&[
                        "suicide",
                        "suicidal",
                        "self-harm",
                        "kill myself",
                        "end my life",
                        "hurt myself",
                        "overdose",
                        "cutting",
                    ]),
                    weight: 2.0,
                },
                CategoryLexicon {
                    category: PostCategory::MentalHealth,
                    keywords: strings(&[
                        "anxiety",
                        "anxious",
                        "depression",
                        "depressed",
                        "panic",
                        "stress",
                        "therapy",
                        "overwhelmed",
                        "lonely",
                        "hopeless",
                        "worthless",
                        "insomnia",
                    ]),
                    weight: 1.0,
                },
                CategoryLexicon {
                    category: PostCategory::Relationships,
                    keywords: strings(&[
                        "boyfriend",
                        "girlfriend",
                        "partner",
                        "breakup",
                        "broke up",
                        "friendship",
                        "family",
                        "parents",
                        "divorce",
                        "cheated",
                    ]),
                    weight: 1.0,
                },
                CategoryLexicon {
                    category: PostCategory::Academic,
                    keywords: strings(&[
                        "exam",
                        "exams",
                        "grade",
                        "grades",
                        "deadline",
                        "assignment",
                        "studying",
                        "professor",
                        "thesis",
                        "failing",
                        "semester",
                    ]),
                    weight: 1.0,
                },
                CategoryLexicon {
                    category: PostCategory::SubstanceAbuse,
                    keywords: strings(&[
                        "alcohol",
                        "drunk",
                        "drinking",
                        "drugs",
                        "weed",
                        "pills",
                        "addiction",
                        "addicted",
                        "hangover",
                    ]),
                    weight: 1.0,
                },
                CategoryLexicon {
                    category: PostCategory::SexualHealth,
                    keywords: strings(&[
                        "contraception",
                        "pregnancy",
                        "pregnant",
                        "std",
                        "sti",
                        "consent",
                        "protection",
                    ]),
                    weight: 1.0,
                },
            ],
            crisis_phrases: strings(&[
                "kill myself",
                "end my life",
                "want to die",
                "suicide",
                "suicidal",
                "self-harm",
                "self harm",
                "hurt myself",
                "no reason to live",
                "better off dead",
                "end it all",
                "can't go on",
            ]),
            urgent_phrases: strings(&[
                "need help now",
                "please help",
                "right now",
                "immediately",
                "emergency",
                "urgent",
                "can't cope",
                "desperate",
            ]),
            intensity_words: strings(&[
                "panic",
                "anxiety",
                "anxious",
                "hopeless",
                "worthless",
                "desperate",
                "terrified",
                "unbearable",
                "overwhelmed",
                "overwhelming",
                "devastated",
                "extremely",
                "horrible",
                "awful",
                "crisis",
            ]),
            positive_words: strings(&[
                "happy",
                "grateful",
                "thankful",
                "thanks",
                "better",
                "improved",
                "hope",
                "hopeful",
                "excited",
                "glad",
                "great",
                "relieved",
                "proud",
                "calm",
            ]),
            negative_words: strings(&[
                "sad",
                "angry",
                "scared",
                "afraid",
                "worried",
                "anxious",
                "depressed",
                "terrible",
                "awful",
                "horrible",
                "lonely",
                "exhausted",
                "hopeless",
                "crying",
                "hurt",
                "pain",
                "stressed",
                "miserable",
            ]),
            stop_words: strings(&[
                "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was",
                "one", "our", "out", "get", "has", "him", "his", "how", "now", "see", "two", "way",
                "who", "its", "did", "she", "too", "use", "that", "with", "have", "this", "will",
                "your", "from", "they", "been", "much", "some", "time", "very", "when", "just",
                "like", "about", "what", "there", "which", "would", "could", "should", "them",
                "were", "than", "then", "into", "because", "while", "where", "after", "before",
                "being", "having", "really",
            ]),
            topics: vec![
                TopicLexicon {
                    name: "exam-stress".to_string(),
                    keywords: strings(&["exam", "deadline", "grades", "studying", "revision"]),
                },
                TopicLexicon {
                    name: "mental-health".to_string(),
                    keywords: strings(&["anxiety", "depression", "panic", "therapy", "hopeless"]),
                },
                TopicLexicon {
                    name: "relationships".to_string(),
                    keywords: strings(&["partner", "breakup", "family", "boyfriend", "girlfriend"]),
                },
                TopicLexicon {
                    name: "sleep".to_string(),
                    keywords: strings(&["insomnia", "sleep", "tired", "exhausted"]),
                },
                TopicLexicon {
                    name: "substance-use".to_string(),
                    keywords: strings(&["alcohol", "drugs", "drinking", "pills", "weed"]),
                },
                TopicLexicon {
                    name: "crisis-support".to_string(),
                    keywords: strings(&["suicide", "self-harm", "crisis"]),
                },
            ],
        }
    }
}
