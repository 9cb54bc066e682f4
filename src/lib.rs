//! # FormCraft - Multi-type form builder service
//!
//! FormCraft stores forms made of categorize, cloze and comprehension
//! questions, and collects responses to them.
//!
//! FormCraft provides:
//! - A typed data model for forms, questions, responses and answers
//! - A storage contract with SQLite, in-memory and JSON-file backends
//! - A dispatcher that picks one backend at startup
//! - An axum HTTP API over the dispatcher
//! - Cloze text helpers for blank detection and rewriting

pub mod model;
pub mod cloze;
pub mod storage;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use model::{Answer, Form, FormPayload, FormSummary, Question, QuestionKind, Response, ResponsePayload};
pub use storage::{Dispatcher, Store};

/// Result type alias for FormCraft operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for FormCraft operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn form_not_found(id: impl Into<String>) -> Self {
        Error::NotFound { entity: "Form", id: id.into() }
    }

    pub fn response_not_found(id: impl Into<String>) -> Self {
        Error::NotFound { entity: "Response", id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
