//! Storage dispatcher
//!
//! Holds the one backend picked at startup and turns the `Option`/`bool`
//! answers of [`Store`] into `Error::NotFound`. Handlers receive a
//! `Dispatcher` through axum state instead of consulting a global flag.

use std::sync::Arc;

use super::{BackendKind, JsonFileStore, MemoryStore, SqliteStore, Store, StoreStats};
use crate::config::{FallbackKind, StorageConfig};
use crate::model::{
    ClientInfo, Form, FormPayload, FormSummary, Pagination, Response, ResponseContent,
    ResponsePage, ResponsePayload, ResponseQuery,
};
use crate::{Error, Result, cloze};

/// Stored as sent; a mismatch is only logged.
fn warn_mismatched_cloze(form: &Form) {
    for question in cloze::mismatched(&form.questions) {
        tracing::warn!(form = %form.id, question, "cloze blanks do not match the bracketed tokens");
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("backend", &self.backend()).finish()
    }
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Pick a backend for `config`.
    ///
    /// A configured database is tried first; if it cannot be reached the
    /// configured fallback is used instead. Only a failure to set up the
    /// fallback itself is an error.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        match config.database_url.as_deref() {
            Some(url) => match SqliteStore::connect(url) {
                Ok(store) => {
                    tracing::info!("Database connected successfully");
                    return Ok(Self::new(Arc::new(store)));
                }
                Err(e) => {
                    tracing::warn!("Database connection failed, using fallback storage: {}", e);
                }
            },
            None => tracing::info!("No database URL found, using fallback storage"),
        }

        let store: Arc<dyn Store> = match config.fallback {
            FallbackKind::Memory => Arc::new(MemoryStore::new()),
            FallbackKind::File => Arc::new(JsonFileStore::open(&config.data_dir).await?),
        };
        Ok(Self::new(store))
    }

    pub fn backend(&self) -> BackendKind {
        self.store.kind()
    }

    // ========== Form Operations ==========

    pub async fn list_forms(&self) -> Result<Vec<Form>> {
        self.store.list_forms().await
    }

    pub async fn list_form_summaries(&self) -> Result<Vec<FormSummary>> {
        Ok(self.list_forms().await?.iter().map(Form::summary).collect())
    }

    pub async fn get_form(&self, id: &str) -> Result<Form> {
        self.store
            .get_form(id)
            .await?
            .ok_or_else(|| Error::form_not_found(id))
    }

    pub async fn create_form(&self, payload: FormPayload) -> Result<Form> {
        let form = self.store.create_form(payload.into_content()).await?;
        tracing::info!(id = %form.id, questions = form.questions.len(), "form created");
        warn_mismatched_cloze(&form);
        Ok(form)
    }

    pub async fn update_form(&self, id: &str, payload: FormPayload) -> Result<Form> {
        let form = self
            .store
            .update_form(id, payload.into_content())
            .await?
            .ok_or_else(|| Error::form_not_found(id))?;
        tracing::info!(id = %form.id, "form updated");
        warn_mismatched_cloze(&form);
        Ok(form)
    }

    /// Delete a form. Its responses are left in place.
    pub async fn delete_form(&self, id: &str) -> Result<()> {
        if !self.store.delete_form(id).await? {
            return Err(Error::form_not_found(id));
        }
        tracing::info!(id, "form deleted");
        Ok(())
    }

    // ========== Response Operations ==========

    /// Store a response for an existing form.
    ///
    /// The existence check and the write are separate calls; a form deleted
    /// in between still receives the response.
    pub async fn submit_response(&self, payload: ResponsePayload, client: ClientInfo) -> Result<Response> {
        if self.store.get_form(&payload.form_id).await?.is_none() {
            return Err(Error::form_not_found(payload.form_id));
        }

        let response = self
            .store
            .create_response(ResponseContent {
                form_id: payload.form_id,
                answers: payload.answers,
                client,
            })
            .await?;
        tracing::info!(id = %response.id, form_id = %response.form_id, "response submitted");
        Ok(response)
    }

    pub async fn list_responses(&self, query: &ResponseQuery) -> Result<ResponsePage> {
        let all = self.store.list_responses(query.form_id.as_deref()).await?;
        let (page, limit) = (query.page(), query.limit());

        let pagination = Pagination::new(page, limit, all.len());
        let responses = all
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Ok(ResponsePage { responses, pagination })
    }

    /// Responses for one form. The form itself must exist.
    pub async fn responses_for_form(&self, form_id: &str) -> Result<Vec<Response>> {
        self.get_form(form_id).await?;
        self.store.list_responses(Some(form_id)).await
    }

    pub async fn get_response(&self, id: &str) -> Result<Response> {
        self.store
            .get_response(id)
            .await?
            .ok_or_else(|| Error::response_not_found(id))
    }

    pub async fn delete_response(&self, id: &str) -> Result<()> {
        if !self.store.delete_response(id).await? {
            return Err(Error::response_not_found(id));
        }
        tracing::info!(id, "response deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}
