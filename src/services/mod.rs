pub mod ai_service;
pub mod chat_client;
pub mod extraction_service;
pub mod hitl_service;
pub mod translation_service;
