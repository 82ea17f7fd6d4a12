pub mod extraction;
pub mod feedback;
pub mod health;
pub mod questions;
pub mod translation;
