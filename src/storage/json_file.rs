//! JSON-file fallback store
//!
//! Two files under a data directory, `forms.json` and `responses.json`, each
//! holding a JSON array. Every mutation reads the whole file, changes it and
//! writes the whole file back. `counters.json` records the highest id ever
//! handed out, so ids of deleted records are not assigned again.
//!
//! There is no lock around that read-modify-write. Two overlapping
//! mutations can both read the old contents, and the later write silently
//! discards the earlier one. An interrupted write is not recovered either.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    BackendKind, FORM_ID_PREFIX, RESPONSE_ID_PREFIX, Store, StoreStats, max_counter, sort_forms,
    sort_responses,
};
use crate::Result;
use crate::model::{Form, FormContent, Response, ResponseContent};

pub const FORMS_FILE: &str = "forms.json";
pub const RESPONSES_FILE: &str = "responses.json";
pub const COUNTERS_FILE: &str = "counters.json";

/// Highest `form_<n>` / `response_<n>` assigned so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Counters {
    forms: u64,
    responses: u64,
}

/// File-backed backend. Ids continue from the highest `form_<n>` /
/// `response_<n>` ever assigned in the directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir` for the data files, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "json file store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn forms_path(&self) -> PathBuf {
        self.dir.join(FORMS_FILE)
    }

    pub fn responses_path(&self) -> PathBuf {
        self.dir.join(RESPONSES_FILE)
    }

    pub fn counters_path(&self) -> PathBuf {
        self.dir.join(COUNTERS_FILE)
    }

    async fn read_counters(&self) -> Result<Counters> {
        read_or_default(&self.counters_path()).await
    }

    async fn write_counters(&self, counters: Counters) -> Result<()> {
        tokio::fs::write(self.counters_path(), serde_json::to_vec(&counters)?).await?;
        Ok(())
    }

    pub(crate) async fn read_forms(&self) -> Result<Vec<Form>> {
        read_or_default(&self.forms_path()).await
    }

    pub(crate) async fn write_forms(&self, forms: &[Form]) -> Result<()> {
        write_array(&self.forms_path(), forms).await
    }

    pub(crate) async fn read_responses(&self) -> Result<Vec<Response>> {
        read_or_default(&self.responses_path()).await
    }

    pub(crate) async fn write_responses(&self, responses: &[Response]) -> Result<()> {
        write_array(&self.responses_path(), responses).await
    }
}

/// A missing or blank file reads as `T::default()`.
async fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(items)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[async_trait]
impl Store for JsonFileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::JsonFile
    }

    async fn list_forms(&self) -> Result<Vec<Form>> {
        let mut forms = self.read_forms().await?;
        sort_forms(&mut forms);
        Ok(forms)
    }

    async fn get_form(&self, id: &str) -> Result<Option<Form>> {
        Ok(self.read_forms().await?.into_iter().find(|f| f.id == id))
    }

    async fn create_form(&self, content: FormContent) -> Result<Form> {
        let mut forms = self.read_forms().await?;
        let mut counters = self.read_counters().await?;
        // Files written before counters.json existed only have the ids on disk.
        let next = counters
            .forms
            .max(max_counter(FORM_ID_PREFIX, forms.iter().map(|f| f.id.as_str())))
            + 1;
        counters.forms = next;
        self.write_counters(counters).await?;

        let form = Form::new(format!("{}{}", FORM_ID_PREFIX, next), content, Utc::now());
        forms.push(form.clone());
        self.write_forms(&forms).await?;
        Ok(form)
    }

    async fn update_form(&self, id: &str, content: FormContent) -> Result<Option<Form>> {
        let mut forms = self.read_forms().await?;
        let Some(form) = forms.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        form.replace_content(content, Utc::now());
        let updated = form.clone();

        self.write_forms(&forms).await?;
        Ok(Some(updated))
    }

    async fn delete_form(&self, id: &str) -> Result<bool> {
        let mut forms = self.read_forms().await?;
        let before = forms.len();
        forms.retain(|f| f.id != id);
        if forms.len() == before {
            return Ok(false);
        }
        self.write_forms(&forms).await?;
        Ok(true)
    }

    async fn list_responses(&self, form_id: Option<&str>) -> Result<Vec<Response>> {
        let mut responses: Vec<Response> = self
            .read_responses()
            .await?
            .into_iter()
            .filter(|r| form_id.is_none_or(|f| r.form_id == f))
            .collect();
        sort_responses(&mut responses);
        Ok(responses)
    }

    async fn get_response(&self, id: &str) -> Result<Option<Response>> {
        Ok(self.read_responses().await?.into_iter().find(|r| r.id == id))
    }

    async fn create_response(&self, content: ResponseContent) -> Result<Response> {
        let mut responses = self.read_responses().await?;
        let mut counters = self.read_counters().await?;
        let next = counters
            .responses
            .max(max_counter(RESPONSE_ID_PREFIX, responses.iter().map(|r| r.id.as_str())))
            + 1;
        counters.responses = next;
        self.write_counters(counters).await?;

        let response = Response::new(format!("{}{}", RESPONSE_ID_PREFIX, next), content, Utc::now());
        responses.push(response.clone());
        self.write_responses(&responses).await?;
        Ok(response)
    }

    async fn delete_response(&self, id: &str) -> Result<bool> {
        let mut responses = self.read_responses().await?;
        let before = responses.len();
        responses.retain(|r| r.id != id);
        if responses.len() == before {
            return Ok(false);
        }
        self.write_responses(&responses).await?;
        Ok(true)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let forms = self.read_forms().await?;
        let responses = self.read_responses().await?;
        Ok(StoreStats {
            backend: BackendKind::JsonFile,
            forms: forms.len(),
            questions: forms.iter().map(|f| f.questions.len()).sum(),
            responses: responses.len(),
        })
    }
}
