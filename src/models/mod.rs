pub mod audit_log;
pub mod difficulty;
pub mod feedback;
pub mod question;
