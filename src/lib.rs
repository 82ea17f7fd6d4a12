pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::database::{
    memory::MemoryBank,
    store::{FeedbackStore, QuestionStore},
};
use crate::error::Result;
use crate::services::{
    ai_service::AIService,
    chat_client::{ChatModel, OpenAiChat},
    extraction_service::ExtractionService,
    hitl_service::HitlService,
    translation_service::TranslationService,
};

#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionStore>,
    pub extraction_service: ExtractionService,
    /// `None` when no model API key is configured.
    pub ai_service: Option<AIService>,
    pub translation_service: Option<TranslationService>,
    pub hitl_service: HitlService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_bank(MemoryBank::new(), config)
    }

    pub fn with_bank(bank: MemoryBank, config: &Config) -> Result<Self> {
        let questions: Arc<dyn QuestionStore> = Arc::new(bank.clone());
        let feedback: Arc<dyn FeedbackStore> = Arc::new(bank);
        Self::with_stores(questions, feedback, config)
    }

    pub fn with_stores(
        questions: Arc<dyn QuestionStore>,
        feedback: Arc<dyn FeedbackStore>,
        config: &Config,
    ) -> Result<Self> {
        let chat = OpenAiChat::from_config(config).map(|c| Arc::new(c) as Arc<dyn ChatModel>);
        Self::with_chat(questions, feedback, chat, config)
    }

    /// Wires every service around an explicit chat model, or none.
    pub fn with_chat(
        questions: Arc<dyn QuestionStore>,
        feedback: Arc<dyn FeedbackStore>,
        chat: Option<Arc<dyn ChatModel>>,
        config: &Config,
    ) -> Result<Self> {
        let extraction_service = ExtractionService::default();
        if chat.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; generation and translation disabled");
        }
        let ai_service = chat
            .clone()
            .map(|chat| AIService::from_config(chat, config, extraction_service.clone()));
        let translation_service = chat.map(TranslationService::new);
        let hitl_service = HitlService::from_config(questions.clone(), feedback, config)?;

        Ok(Self {
            questions,
            extraction_service,
            ai_service,
            translation_service,
            hitl_service,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/extract", post(routes::extraction::extract))
        .route(
            "/api/questions",
            get(routes::questions::list_questions).post(routes::questions::create_question),
        )
        .route(
            "/api/questions/generate",
            post(routes::questions::generate_question),
        )
        .route(
            "/api/questions/translate-batch",
            post(routes::translation::translate_batch),
        )
        .route(
            "/api/questions/:id/translate",
            post(routes::translation::translate_question),
        )
        .route(
            "/api/questions/:id/feedback-stats",
            get(routes::feedback::feedback_stats),
        )
        .route(
            "/api/questions/:id/difficulty-analysis",
            get(routes::feedback::difficulty_analysis),
        )
        .route("/api/feedback", post(routes::feedback::submit_feedback))
        .route(
            "/api/difficulty/auto-adjust",
            post(routes::feedback::auto_adjust),
        )
        .route(
            "/api/difficulty/adjustments",
            get(routes::feedback::list_adjustments),
        );

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(api)
        .with_state(state)
        .layer(middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
}
