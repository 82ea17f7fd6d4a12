use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::{FeedbackStore, QuestionStore};
use crate::error::{Error, Result};
use crate::models::audit_log::DifficultyAdjustmentLog;
use crate::models::feedback::{Feedback, FeedbackStats};
use crate::models::question::{QuestionFilter, QuestionRecord};
use crate::utils::time::now;

#[derive(Default)]
struct BankTables {
    questions: Vec<QuestionRecord>,
    feedback: Vec<Feedback>,
    adjustments: Vec<DifficultyAdjustmentLog>,
}

/// In-process question bank backing both storage traits.
#[derive(Clone, Default)]
pub struct MemoryBank {
    tables: Arc<RwLock<BankTables>>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionStore for MemoryBank {
    async fn save_question(&self, question: QuestionRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.questions.iter().any(|q| q.id == question.id) {
            return Err(Error::BadRequest(format!(
                "Question {} already exists",
                question.id
            )));
        }
        tables.questions.push(question);
        Ok(())
    }

    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<QuestionRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    async fn get_question(&self, id: &str) -> Result<Option<QuestionRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }
}

#[async_trait]
impl FeedbackStore for MemoryBank {
    async fn save_feedback(&self, feedback: Feedback) -> Result<()> {
        self.tables.write().await.feedback.push(feedback);
        Ok(())
    }

    async fn feedback_stats(&self, question_id: &str) -> Result<Option<FeedbackStats>> {
        let tables = self.tables.read().await;
        Ok(FeedbackStats::from_feedback(
            tables.feedback.iter().filter(|f| f.question_id == question_id),
        ))
    }

    async fn adjust_difficulty(
        &self,
        question_id: &str,
        new_difficulty: &str,
        reason: &str,
        adjusted_by: &str,
    ) -> Result<DifficultyAdjustmentLog> {
        let mut tables = self.tables.write().await;
        let question = tables
            .questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| Error::NotFound(format!("Question {} not found", question_id)))?;

        let original = std::mem::replace(&mut question.difficulty, new_difficulty.to_string());
        let log = DifficultyAdjustmentLog {
            id: Uuid::new_v4(),
            question_id: question_id.to_string(),
            original_difficulty: Some(original),
            new_difficulty: new_difficulty.to_string(),
            reason: reason.to_string(),
            adjusted_by: adjusted_by.to_string(),
            adjusted_at: now(),
        };
        tables.adjustments.push(log.clone());
        Ok(log)
    }

    async fn list_adjustments(&self) -> Result<Vec<DifficultyAdjustmentLog>> {
        Ok(self.tables.read().await.adjustments.clone())
    }

    async fn count_feedback(&self) -> Result<usize> {
        Ok(self.tables.read().await.feedback.len())
    }

    async fn count_adjustments(&self) -> Result<usize> {
        Ok(self.tables.read().await.adjustments.len())
    }
}
