use std::collections::BTreeMap;
use std::sync::Arc;

use assessment_bank::config::Config;
use assessment_bank::database::memory::MemoryBank;
use assessment_bank::error::Error;
use assessment_bank::database::store::{FeedbackStore, QuestionStore};
use assessment_bank::models::difficulty::{DifficultyThresholdTable, RecalibrationResult};
use assessment_bank::models::feedback::{Feedback, FeedbackStats};
use assessment_bank::models::question::{QuestionRecord, QuestionType};
use assessment_bank::services::hitl_service::{
    recalibrate, DifficultyRecalibrator, HitlService, QuestionFeedback,
};
use chrono::Utc;

fn stats(avg: f64, count: u32, votes: &[(&str, u32)]) -> FeedbackStats {
    FeedbackStats {
        average_difficulty: Some(avg),
        feedback_count: count,
        difficulty_votes: votes
            .iter()
            .map(|(label, n)| (label.to_string(), *n))
            .collect::<BTreeMap<_, _>>(),
        ..Default::default()
    }
}

#[test]
fn two_reviews_are_not_enough() {
    let result = recalibrate(
        "basic",
        &stats(4.9, 2, &[("advanced", 2)]),
        &DifficultyThresholdTable::default(),
    );
    assert_eq!(result.status(), "insufficient_data");
    assert!(result.adjustment().is_none());
}

#[test]
fn majority_vote_overrides_average() {
    let result = recalibrate(
        "basic",
        &stats(4.2, 5, &[("advanced", 2), ("intermediate", 3)]),
        &DifficultyThresholdTable::default(),
    );

    let RecalibrationResult::Analyzed(analysis) = result else {
        panic!("expected an analysis");
    };
    assert!(analysis.needs_adjustment);
    assert_eq!(analysis.implied_difficulty.as_deref(), Some("advanced"));
    assert_eq!(analysis.recommended_difficulty, "intermediate");
    assert_eq!(analysis.confidence_percent, 60.0);
    assert_eq!(analysis.reason, "avg 4.2, 60% voted intermediate");
}

#[test]
fn batch_matches_single_question_results() {
    let recalibrator = DifficultyRecalibrator::default();
    let items = vec![
        QuestionFeedback {
            question_id: "Q1".into(),
            current_difficulty: "basic".into(),
            stats: stats(4.2, 5, &[("advanced", 2), ("intermediate", 3)]),
        },
        QuestionFeedback {
            question_id: "Q2".into(),
            current_difficulty: "intermediate".into(),
            stats: stats(3.0, 4, &[("intermediate", 4)]),
        },
        QuestionFeedback {
            question_id: "Q3".into(),
            current_difficulty: "advanced".into(),
            stats: stats(1.4, 1, &[]),
        },
        QuestionFeedback {
            question_id: "Q4".into(),
            current_difficulty: "advanced".into(),
            stats: stats(1.8, 3, &[]),
        },
    ];

    let batch = recalibrator.plan_adjustments(&items);

    let single: Vec<(String, String, String)> = items
        .iter()
        .filter_map(|item| {
            recalibrator
                .recalibrate(&item.current_difficulty, &item.stats)
                .adjustment()
                .map(|a| {
                    (
                        item.question_id.clone(),
                        a.recommended_difficulty.clone(),
                        a.reason.clone(),
                    )
                })
        })
        .collect();
    let from_batch: Vec<(String, String, String)> = batch
        .iter()
        .map(|r| (r.question_id.clone(), r.to_difficulty.clone(), r.reason.clone()))
        .collect();

    assert_eq!(from_batch, single);
    assert_eq!(
        batch.iter().map(|r| r.question_id.as_str()).collect::<Vec<_>>(),
        vec!["Q1", "Q4"]
    );
}

#[tokio::test]
async fn auto_adjust_updates_bank_and_audit_trail() {
    let bank = MemoryBank::new();
    for (id, difficulty) in [("Q1", "basic"), ("Q2", "advanced")] {
        bank.save_question(QuestionRecord {
            id: id.into(),
            area: "news".into(),
            difficulty: difficulty.into(),
            question_type: QuestionType::Subjective,
            question: format!("Question {}", id),
            ai_generated: false,
            metadata: serde_json::json!({}),
        })
        .await
        .unwrap();
    }
    for (id, rating, vote) in [
        ("Q1", 4, "advanced"),
        ("Q1", 5, "advanced"),
        ("Q1", 4, "advanced"),
        ("Q2", 5, "advanced"),
    ] {
        bank.save_feedback(Feedback {
            question_id: id.into(),
            user_id: "reviewer".into(),
            difficulty_rating: rating,
            relevance_rating: 4,
            clarity_rating: 4,
            comments: String::new(),
            actual_difficulty: Some(vote.into()),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    let service = HitlService::from_config(
        Arc::new(bank.clone()),
        Arc::new(bank.clone()),
        &Config::local("127.0.0.1:0"),
    )
    .unwrap();
    let applied = service.auto_adjust_all().await.unwrap();

    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].question_id, "Q1");
    assert_eq!(applied[0].reason, "avg 4.3, 100% voted advanced");

    let q1 = bank.get_question("Q1").await.unwrap().unwrap();
    assert_eq!(q1.difficulty, "advanced");

    let log = bank.list_adjustments().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].original_difficulty.as_deref(), Some("basic"));
    assert_eq!(log[0].adjusted_by, "auto_system");

    // Nothing left to change on a second pass.
    assert!(service.auto_adjust_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn configured_thresholds_drive_auto_adjust() {
    let bank = MemoryBank::new();
    bank.save_question(QuestionRecord {
        id: "Q1".into(),
        area: "news".into(),
        difficulty: "easy".into(),
        question_type: QuestionType::Subjective,
        question: "Summarise the briefing".into(),
        ai_generated: false,
        metadata: serde_json::json!({}),
    })
    .await
    .unwrap();
    for rating in [4, 4, 5] {
        bank.save_feedback(Feedback {
            question_id: "Q1".into(),
            user_id: "reviewer".into(),
            difficulty_rating: rating,
            relevance_rating: 4,
            clarity_rating: 4,
            comments: String::new(),
            actual_difficulty: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    let mut config = Config::local("127.0.0.1:0");
    config.difficulty_thresholds = Some("easy:1.0-3.0,hard:3.0-5.0".into());
    let service =
        HitlService::from_config(Arc::new(bank.clone()), Arc::new(bank.clone()), &config).unwrap();

    let applied = service.auto_adjust_all().await.unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].to_difficulty, "hard");
}

#[test]
fn invalid_configured_thresholds_fail_startup() {
    let bank = MemoryBank::new();
    let mut config = Config::local("127.0.0.1:0");
    config.difficulty_thresholds = Some("basic:1.0-2.0,advanced:3.0-5.0".into());

    let result = HitlService::from_config(Arc::new(bank.clone()), Arc::new(bank), &config);
    assert!(matches!(result, Err(Error::InvalidThresholds(_))));
}
