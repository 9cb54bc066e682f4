//! In-memory fallback store
//!
//! Keyed maps plus monotonic counters for id assignment. Everything is lost
//! when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{BackendKind, FORM_ID_PREFIX, RESPONSE_ID_PREFIX, Store, StoreStats, sort_forms, sort_responses};
use crate::Result;
use crate::model::{Form, FormContent, Response, ResponseContent};

#[derive(Debug, Default)]
struct MemoryState {
    forms: HashMap<String, Form>,
    responses: HashMap<String, Response>,
    form_counter: u64,
    response_counter: u64,
}

/// Process-memory backend. Ids are `form_<n>` / `response_<n>`, starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn list_forms(&self) -> Result<Vec<Form>> {
        let state = self.state.read().await;
        let mut forms: Vec<Form> = state.forms.values().cloned().collect();
        sort_forms(&mut forms);
        Ok(forms)
    }

    async fn get_form(&self, id: &str) -> Result<Option<Form>> {
        Ok(self.state.read().await.forms.get(id).cloned())
    }

    async fn create_form(&self, content: FormContent) -> Result<Form> {
        let mut state = self.state.write().await;
        state.form_counter += 1;
        let id = format!("{}{}", FORM_ID_PREFIX, state.form_counter);

        let form = Form::new(id.clone(), content, Utc::now());
        state.forms.insert(id, form.clone());
        Ok(form)
    }

    async fn update_form(&self, id: &str, content: FormContent) -> Result<Option<Form>> {
        let mut state = self.state.write().await;
        let Some(form) = state.forms.get_mut(id) else {
            return Ok(None);
        };
        form.replace_content(content, Utc::now());
        Ok(Some(form.clone()))
    }

    async fn delete_form(&self, id: &str) -> Result<bool> {
        Ok(self.state.write().await.forms.remove(id).is_some())
    }

    async fn list_responses(&self, form_id: Option<&str>) -> Result<Vec<Response>> {
        let state = self.state.read().await;
        let mut responses: Vec<Response> = state
            .responses
            .values()
            .filter(|r| form_id.is_none_or(|f| r.form_id == f))
            .cloned()
            .collect();
        sort_responses(&mut responses);
        Ok(responses)
    }

    async fn get_response(&self, id: &str) -> Result<Option<Response>> {
        Ok(self.state.read().await.responses.get(id).cloned())
    }

    async fn create_response(&self, content: ResponseContent) -> Result<Response> {
        let mut state = self.state.write().await;
        state.response_counter += 1;
        let id = format!("{}{}", RESPONSE_ID_PREFIX, state.response_counter);

        let response = Response::new(id.clone(), content, Utc::now());
        state.responses.insert(id, response.clone());
        Ok(response)
    }

    async fn delete_response(&self, id: &str) -> Result<bool> {
        Ok(self.state.write().await.responses.remove(id).is_some())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.read().await;
        Ok(StoreStats {
            backend: BackendKind::Memory,
            forms: state.forms.len(),
            questions: state.forms.values().map(|f| f.questions.len()).sum(),
            responses: state.responses.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormPayload;
    use crate::storage::contract;

    #[tokio::test]
    async fn test_store_contract() {
        contract::run_all(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_counter_ids() {
        let store = MemoryStore::new();
        let first = store.create_form(FormPayload::titled("One").into_content()).await.unwrap();
        let second = store.create_form(FormPayload::titled("Two").into_content()).await.unwrap();
        assert_eq!(first.id, "form_1");
        assert_eq!(second.id, "form_2");

        // Counters never reuse an id after a delete.
        assert!(store.delete_form(&second.id).await.unwrap());
        let third = store.create_form(FormPayload::titled("Three").into_content()).await.unwrap();
        assert_eq!(third.id, "form_3");
    }
}
