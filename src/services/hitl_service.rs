use std::sync::Arc;

use crate::config::{Config, DEFAULT_MIN_FEEDBACK_COUNT};
use crate::database::store::{FeedbackStore, QuestionStore};
use crate::error::{Error, Result};
use crate::models::audit_log::DifficultyAdjustmentLog;
use crate::models::difficulty::{
    default_bands, AdjustmentRecord, DifficultyAnalysis, DifficultyThresholdTable,
    RecalibrationResult,
};
use crate::models::feedback::{Feedback, FeedbackStats};
use crate::models::question::QuestionFilter;

/// Turns aggregated reviewer feedback into a difficulty recommendation.
#[derive(Debug, Clone)]
pub struct DifficultyRecalibrator {
    thresholds: DifficultyThresholdTable,
    min_feedback: u32,
}

impl Default for DifficultyRecalibrator {
    fn default() -> Self {
        Self::new(DifficultyThresholdTable::default(), DEFAULT_MIN_FEEDBACK_COUNT)
    }
}

impl DifficultyRecalibrator {
    pub fn new(thresholds: DifficultyThresholdTable, min_feedback: u32) -> Self {
        Self {
            thresholds,
            min_feedback,
        }
    }

    pub fn min_feedback(&self) -> u32 {
        self.min_feedback
    }

    pub fn recalibrate(&self, current: &str, stats: &FeedbackStats) -> RecalibrationResult {
        if stats.feedback_count < self.min_feedback {
            return RecalibrationResult::InsufficientData {
                feedback_count: stats.feedback_count,
                required: self.min_feedback,
            };
        }

        let implied = stats
            .average_difficulty
            .and_then(|avg| self.thresholds.implied_label(avg))
            .map(str::to_string);

        let mut recommended = current.to_string();
        let mut needs_adjustment = false;

        if let Some(label) = implied.as_deref() {
            if label != current {
                recommended = label.to_string();
                needs_adjustment = true;
            }
        }

        let (plurality, confidence) = plurality_vote(stats);
        // A clear majority of reviewers outranks the averaged rating.
        if let Some(label) = plurality.as_deref() {
            if confidence > 50.0 && label != current {
                recommended = label.to_string();
                needs_adjustment = true;
            }
        }

        let avg_text = stats
            .average_difficulty
            .map(|avg| format!("{:.1}", avg))
            .unwrap_or_else(|| "n/a".to_string());
        let reason = format!("avg {}, {:.0}% voted {}", avg_text, confidence, recommended);

        RecalibrationResult::Analyzed(DifficultyAnalysis {
            current_difficulty: current.to_string(),
            average_difficulty_rating: stats.average_difficulty,
            implied_difficulty: implied,
            plurality_difficulty: plurality,
            recommended_difficulty: recommended,
            needs_adjustment,
            confidence_percent: confidence,
            feedback_count: stats.feedback_count,
            difficulty_votes: stats.difficulty_votes.clone(),
            reason,
        })
    }

    /// Adjustments for every question whose analysis recommends a change,
    /// in input order.
    pub fn plan_adjustments(&self, items: &[QuestionFeedback]) -> Vec<AdjustmentRecord> {
        items
            .iter()
            .filter_map(|item| {
                let result = self.recalibrate(&item.current_difficulty, &item.stats);
                result.adjustment().map(|analysis| AdjustmentRecord {
                    question_id: item.question_id.clone(),
                    from_difficulty: item.current_difficulty.clone(),
                    to_difficulty: analysis.recommended_difficulty.clone(),
                    reason: analysis.reason.clone(),
                })
            })
            .collect()
    }
}

/// Single-shot recalibration with the default feedback minimum.
pub fn recalibrate(
    current: &str,
    stats: &FeedbackStats,
    thresholds: &DifficultyThresholdTable,
) -> RecalibrationResult {
    DifficultyRecalibrator::new(thresholds.clone(), DEFAULT_MIN_FEEDBACK_COUNT)
        .recalibrate(current, stats)
}

// Ties go to the label that sorts first.
fn plurality_vote(stats: &FeedbackStats) -> (Option<String>, f64) {
    let mut top: Option<(&String, u32)> = None;
    for (label, &count) in &stats.difficulty_votes {
        if top.map_or(true, |(_, best)| count > best) {
            top = Some((label, count));
        }
    }

    match top {
        Some((label, count)) if stats.feedback_count > 0 => (
            Some(label.clone()),
            f64::from(count) / f64::from(stats.feedback_count) * 100.0,
        ),
        _ => (None, 0.0),
    }
}

#[derive(Debug, Clone)]
pub struct QuestionFeedback {
    pub question_id: String,
    pub current_difficulty: String,
    pub stats: FeedbackStats,
}

#[derive(Debug, Clone)]
pub struct AdjustmentHistory {
    pub adjustments: Vec<DifficultyAdjustmentLog>,
    pub feedback_count: usize,
    pub adjustment_count: usize,
}

#[derive(Clone)]
pub struct HitlService {
    questions: Arc<dyn QuestionStore>,
    feedback: Arc<dyn FeedbackStore>,
    recalibrator: DifficultyRecalibrator,
    adjusted_by: String,
}

impl HitlService {
    pub fn new(
        questions: Arc<dyn QuestionStore>,
        feedback: Arc<dyn FeedbackStore>,
        recalibrator: DifficultyRecalibrator,
        adjusted_by: impl Into<String>,
    ) -> Self {
        Self {
            questions,
            feedback,
            recalibrator,
            adjusted_by: adjusted_by.into(),
        }
    }

    /// Fails with `InvalidThresholds` when the configured bands do not tile the rating scale.
    pub fn from_config(
        questions: Arc<dyn QuestionStore>,
        feedback: Arc<dyn FeedbackStore>,
        config: &Config,
    ) -> Result<Self> {
        let thresholds = match config.difficulty_thresholds.as_deref() {
            Some(raw) => DifficultyThresholdTable::parse(raw)?,
            None => DifficultyThresholdTable::new(default_bands())?,
        };
        let recalibrator = DifficultyRecalibrator::new(thresholds, config.min_feedback_count);
        Ok(Self::new(
            questions,
            feedback,
            recalibrator,
            config.auto_adjust_actor.clone(),
        ))
    }

    pub async fn submit_feedback(&self, feedback: Feedback) -> Result<()> {
        if self.questions.get_question(&feedback.question_id).await?.is_none() {
            return Err(Error::NotFound(format!(
                "Question {} not found",
                feedback.question_id
            )));
        }
        tracing::info!(
            question_id = %feedback.question_id,
            rating = feedback.difficulty_rating,
            "Feedback recorded"
        );
        self.feedback.save_feedback(feedback).await
    }

    pub async fn feedback_stats(&self, question_id: &str) -> Result<Option<FeedbackStats>> {
        self.feedback.feedback_stats(question_id).await
    }

    pub async fn analyze_question(&self, question_id: &str) -> Result<RecalibrationResult> {
        let question = self
            .questions
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Question {} not found", question_id)))?;

        let result = match self.feedback.feedback_stats(question_id).await? {
            Some(stats) => self.recalibrator.recalibrate(&question.difficulty, &stats),
            None => RecalibrationResult::InsufficientData {
                feedback_count: 0,
                required: self.recalibrator.min_feedback(),
            },
        };
        tracing::debug!(question_id, status = result.status(), "Difficulty analyzed");
        Ok(result)
    }

    /// Recalibrates every stored question and persists each recommended
    /// change. A failed write is logged and left out of the result.
    pub async fn auto_adjust_all(&self) -> Result<Vec<AdjustmentRecord>> {
        let questions = self.questions.list_questions(QuestionFilter::default()).await?;

        let mut items = Vec::with_capacity(questions.len());
        for question in questions {
            if let Some(stats) = self.feedback.feedback_stats(&question.id).await? {
                items.push(QuestionFeedback {
                    question_id: question.id,
                    current_difficulty: question.difficulty,
                    stats,
                });
            }
        }

        let planned = self.recalibrator.plan_adjustments(&items);
        let mut applied = Vec::with_capacity(planned.len());
        for record in planned {
            match self
                .feedback
                .adjust_difficulty(
                    &record.question_id,
                    &record.to_difficulty,
                    &record.reason,
                    &self.adjusted_by,
                )
                .await
            {
                Ok(_) => {
                    tracing::info!(
                        question_id = %record.question_id,
                        from = %record.from_difficulty,
                        to = %record.to_difficulty,
                        "Difficulty adjusted"
                    );
                    applied.push(record);
                }
                Err(e) => {
                    tracing::error!(
                        question_id = %record.question_id,
                        "Failed to persist difficulty adjustment: {}",
                        e
                    );
                }
            }
        }

        tracing::info!(
            analyzed = items.len(),
            adjusted = applied.len(),
            "Auto-adjust finished"
        );
        Ok(applied)
    }

    pub async fn adjustment_history(&self) -> Result<AdjustmentHistory> {
        Ok(AdjustmentHistory {
            adjustments: self.feedback.list_adjustments().await?,
            feedback_count: self.feedback.count_feedback().await?,
            adjustment_count: self.feedback.count_adjustments().await?,
        })
    }
}
