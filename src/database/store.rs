use async_trait::async_trait;

use crate::error::Result;
use crate::models::audit_log::DifficultyAdjustmentLog;
use crate::models::feedback::{Feedback, FeedbackStats};
use crate::models::question::{QuestionFilter, QuestionRecord};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn save_question(&self, question: QuestionRecord) -> Result<()>;

    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<QuestionRecord>>;

    async fn get_question(&self, id: &str) -> Result<Option<QuestionRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn save_feedback(&self, feedback: Feedback) -> Result<()>;

    /// `None` when the question has no feedback yet.
    async fn feedback_stats(&self, question_id: &str) -> Result<Option<FeedbackStats>>;

    /// Sets the question's difficulty and appends the audit row in one step.
    async fn adjust_difficulty(
        &self,
        question_id: &str,
        new_difficulty: &str,
        reason: &str,
        adjusted_by: &str,
    ) -> Result<DifficultyAdjustmentLog>;

    async fn list_adjustments(&self) -> Result<Vec<DifficultyAdjustmentLog>>;

    async fn count_feedback(&self) -> Result<usize>;

    async fn count_adjustments(&self) -> Result<usize>;
}
