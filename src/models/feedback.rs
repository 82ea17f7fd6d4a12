use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub question_id: String,
    pub user_id: String,
    pub difficulty_rating: u8,
    pub relevance_rating: u8,
    pub clarity_rating: u8,
    pub comments: String,
    /// Difficulty label the reviewer believes the question actually has.
    pub actual_difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregated feedback for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub average_difficulty: Option<f64>,
    #[serde(default)]
    pub average_relevance: Option<f64>,
    #[serde(default)]
    pub average_clarity: Option<f64>,
    pub feedback_count: u32,
    #[serde(default)]
    pub difficulty_votes: BTreeMap<String, u32>,
}

impl FeedbackStats {
    pub fn from_feedback<'a, I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Feedback>,
    {
        let mut count = 0u32;
        let (mut difficulty, mut relevance, mut clarity) = (0u64, 0u64, 0u64);
        let mut votes = BTreeMap::new();

        for fb in items {
            count += 1;
            difficulty += u64::from(fb.difficulty_rating);
            relevance += u64::from(fb.relevance_rating);
            clarity += u64::from(fb.clarity_rating);
            if let Some(label) = fb.actual_difficulty.as_deref().map(str::trim) {
                if !label.is_empty() {
                    *votes.entry(label.to_string()).or_insert(0) += 1;
                }
            }
        }

        if count == 0 {
            return None;
        }

        let avg = |sum: u64| Some(sum as f64 / f64::from(count));
        Some(Self {
            average_difficulty: avg(difficulty),
            average_relevance: avg(relevance),
            average_clarity: avg(clarity),
            feedback_count: count,
            difficulty_votes: votes,
        })
    }
}
