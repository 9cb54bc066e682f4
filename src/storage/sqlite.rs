//! SQLite storage implementation
//!
//! The database backend. Every write is a single statement issued while
//! holding the connection lock, so each document is replaced atomically.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::Mutex;

use super::{BackendKind, Store, StoreStats, schema, sort_forms, sort_responses};
use crate::model::{Form, FormContent, Response, ResponseContent};
use crate::{Error, Result};

/// Length of database-native ids (hex characters).
pub const DATABASE_ID_LEN: usize = 24;

/// SQLite-backed storage for forms and responses
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Connect using a database URL and check the connection is usable.
    ///
    /// Accepts `sqlite://path`, `sqlite:path`, a plain path, or `:memory:`.
    /// Any failure is reported as `Error::BackendUnavailable`.
    pub fn connect(url: &str) -> Result<Self> {
        let target = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if target.contains("://") {
            return Err(Error::BackendUnavailable(format!("unsupported database URL: {}", url)));
        }

        let store = if target == ":memory:" {
            Self::open_in_memory()
        } else {
            let path = Path::new(target);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| Error::BackendUnavailable(format!("{}: {}", parent.display(), e)))?;
                }
            }
            Self::open(path)
        };

        let store = store.map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        store.ping().map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn ping(&self) -> Result<()> {
        let conn = self.conn.try_lock().map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Generate a database-native id: 24 lowercase hex characters.
    pub fn generate_id() -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(DATABASE_ID_LEN);
        id
    }

    /// Whether `id` has the shape of a database-native id.
    pub fn is_database_id(id: &str) -> bool {
        id.len() == DATABASE_ID_LEN && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    // ========== Form Operations ==========

    fn select_form(conn: &Connection, id: &str) -> rusqlite::Result<Option<Form>> {
        conn.query_row("SELECT document FROM forms WHERE id = ?1", [id], Self::row_to_form)
            .optional()
    }

    /// Helper to convert a row to a Form
    fn row_to_form(row: &rusqlite::Row) -> rusqlite::Result<Form> {
        let document: String = row.get(0)?;
        serde_json::from_str(&document).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    // ========== Response Operations ==========

    /// Helper to convert a row to a Response
    fn row_to_response(row: &rusqlite::Row) -> rusqlite::Result<Response> {
        let document: String = row.get(0)?;
        serde_json::from_str(&document).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn list_forms(&self) -> Result<Vec<Form>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT document FROM forms ORDER BY updated_at DESC")?;
        let mut forms = stmt
            .query_map([], Self::row_to_form)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        sort_forms(&mut forms);
        Ok(forms)
    }

    async fn get_form(&self, id: &str) -> Result<Option<Form>> {
        let conn = self.conn.lock().await;
        Ok(Self::select_form(&conn, id)?)
    }

    async fn create_form(&self, content: FormContent) -> Result<Form> {
        let form = Form::new(Self::generate_id(), content, Utc::now());
        let document = serde_json::to_string(&form)?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO forms (id, document, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                form.id,
                document,
                form.created_at.timestamp_micros(),
                form.updated_at.timestamp_micros(),
            ],
        )?;
        tracing::debug!(id = %form.id, "form inserted");
        Ok(form)
    }

    async fn update_form(&self, id: &str, content: FormContent) -> Result<Option<Form>> {
        let conn = self.conn.lock().await;
        let Some(mut form) = Self::select_form(&conn, id)? else {
            return Ok(None);
        };

        form.replace_content(content, Utc::now());
        conn.execute(
            "UPDATE forms SET document = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, serde_json::to_string(&form)?, form.updated_at.timestamp_micros()],
        )?;
        Ok(Some(form))
    }

    async fn delete_form(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM forms WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    async fn list_responses(&self, form_id: Option<&str>) -> Result<Vec<Response>> {
        let conn = self.conn.lock().await;
        let mut responses = if let Some(form_id) = form_id {
            let mut stmt = conn.prepare(
                "SELECT document FROM responses WHERE form_id = ?1 ORDER BY submitted_at DESC",
            )?;
            stmt.query_map([form_id], Self::row_to_response)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            let mut stmt = conn.prepare("SELECT document FROM responses ORDER BY submitted_at DESC")?;
            stmt.query_map([], Self::row_to_response)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        sort_responses(&mut responses);
        Ok(responses)
    }

    async fn get_response(&self, id: &str) -> Result<Option<Response>> {
        let conn = self.conn.lock().await;
        Ok(conn
            .query_row("SELECT document FROM responses WHERE id = ?1", [id], Self::row_to_response)
            .optional()?)
    }

    async fn create_response(&self, content: ResponseContent) -> Result<Response> {
        let response = Response::new(Self::generate_id(), content, Utc::now());
        let document = serde_json::to_string(&response)?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO responses (id, form_id, document, submitted_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                response.id,
                response.form_id,
                document,
                response.submitted_at.timestamp_micros(),
            ],
        )?;
        Ok(response)
    }

    async fn delete_response(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM responses WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock().await;
        let forms: i64 = conn.query_row("SELECT COUNT(*) FROM forms", [], |row| row.get(0))?;
        let questions: i64 = conn.query_row(
            "SELECT COALESCE(SUM(json_array_length(document, '$.questions')), 0) FROM forms",
            [],
            |row| row.get(0),
        )?;
        let responses: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;

        Ok(StoreStats {
            backend: BackendKind::Sqlite,
            forms: forms as usize,
            questions: questions as usize,
            responses: responses as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormPayload;
    use crate::storage::contract;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_contract() {
        let store = SqliteStore::open_in_memory().unwrap();
        contract::run_all(&store).await;
    }

    #[test]
    fn test_database_ids() {
        let id = SqliteStore::generate_id();
        assert!(SqliteStore::is_database_id(&id));
        assert!(!SqliteStore::is_database_id("form_1"));
        assert!(!SqliteStore::is_database_id("response_12"));
    }

    #[test]
    fn test_connect_urls() {
        assert!(SqliteStore::connect(":memory:").is_ok());
        assert!(SqliteStore::connect("sqlite://:memory:").is_ok());

        let err = SqliteStore::connect("mongodb://localhost:27017/formcraft").err().unwrap();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_connect_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("formcraft.db");
        let store = SqliteStore::connect(&format!("sqlite://{}", path.display())).unwrap();

        store.create_form(FormPayload::titled("Persisted").into_content()).await.unwrap();
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        let forms = reopened.list_forms().await.unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].title, "Persisted");
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let a = store.create_form(FormPayload::titled("A").into_content()).await.unwrap();
        let b = store.create_form(FormPayload::titled("B").into_content()).await.unwrap();

        let (first, second) = tokio::join!(
            store.update_form(&a.id, FormPayload::titled("A2").into_content()),
            store.update_form(&b.id, FormPayload::titled("B2").into_content()),
        );
        assert!(first.unwrap().is_some());
        assert!(second.unwrap().is_some());

        assert_eq!(store.get_form(&a.id).await.unwrap().unwrap().title, "A2");
        assert_eq!(store.get_form(&b.id).await.unwrap().unwrap().title, "B2");
    }

    #[tokio::test]
    async fn test_concurrent_updates_same_form_never_tear() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let form = store.create_form(FormPayload::titled("Quiz").into_content()).await.unwrap();

        let mut left = FormPayload::titled("Left");
        left.description = Some("from left".into());
        let mut right = FormPayload::titled("Right");
        right.description = Some("from right".into());

        let (l, r) = tokio::join!(
            store.update_form(&form.id, left.into_content()),
            store.update_form(&form.id, right.into_content()),
        );
        l.unwrap();
        r.unwrap();

        let stored = store.get_form(&form.id).await.unwrap().unwrap();
        let pair = (stored.title.as_str(), stored.description.as_str());
        assert!(pair == ("Left", "from left") || pair == ("Right", "from right"));
    }
}
