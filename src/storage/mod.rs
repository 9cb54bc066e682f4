//! Storage Layer - one contract, three backends
//!
//! - `SqliteStore`: the database backend, one JSON document per row
//! - `MemoryStore`: process-memory fallback, lost on restart
//! - `JsonFileStore`: file fallback, `forms.json` / `responses.json`
//!
//! The `Dispatcher` owns exactly one backend, chosen at startup.

pub mod schema;
pub mod sqlite;
pub mod memory;
pub mod json_file;
pub mod dispatcher;

#[cfg(test)]
pub(crate) mod contract;

pub use sqlite::SqliteStore;
pub use memory::MemoryStore;
pub use json_file::JsonFileStore;
pub use dispatcher::Dispatcher;

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::model::{Form, FormContent, Response, ResponseContent};

/// Which backend a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Sqlite,
    Memory,
    JsonFile,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
            BackendKind::JsonFile => "json-file",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, BackendKind::Sqlite)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persistence contract for forms and responses.
///
/// Absent ids are reported as `None` / `false`, never as errors; any `Err`
/// is a backend failure.
#[async_trait]
pub trait Store: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// All forms, most recently updated first.
    async fn list_forms(&self) -> Result<Vec<Form>>;

    async fn get_form(&self, id: &str) -> Result<Option<Form>>;

    /// Assign an id and both timestamps, persist, return the stored form.
    async fn create_form(&self, content: FormContent) -> Result<Form>;

    /// Replace the mutable fields of form `id`.
    async fn update_form(&self, id: &str, content: FormContent) -> Result<Option<Form>>;

    /// Returns true if the form existed and was deleted.
    async fn delete_form(&self, id: &str) -> Result<bool>;

    /// Responses, newest first, optionally restricted to one form.
    async fn list_responses(&self, form_id: Option<&str>) -> Result<Vec<Response>>;

    async fn get_response(&self, id: &str) -> Result<Option<Response>>;

    async fn create_response(&self, content: ResponseContent) -> Result<Response>;

    async fn delete_response(&self, id: &str) -> Result<bool>;

    async fn stats(&self) -> Result<StoreStats>;
}

/// Row counts for a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub backend: BackendKind,
    pub forms: usize,
    pub questions: usize,
    pub responses: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Storage Statistics ({}):", self.backend)?;
        writeln!(f, "  Forms: {}", self.forms)?;
        writeln!(f, "  Questions: {}", self.questions)?;
        writeln!(f, "  Responses: {}", self.responses)
    }
}

/// Sort forms most recently updated first.
pub(crate) fn sort_forms(forms: &mut [Form]) {
    forms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Sort responses newest first.
pub(crate) fn sort_responses(responses: &mut [Response]) {
    responses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}

/// Highest `<prefix><n>` counter among `ids`.
pub(crate) fn max_counter<'a>(prefix: &str, ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Prefix of fallback form ids.
pub const FORM_ID_PREFIX: &str = "form_";
/// Prefix of fallback response ids.
pub const RESPONSE_ID_PREFIX: &str = "response_";
