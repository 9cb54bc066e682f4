//! Form and response types
//!
//! Every form is an ordered list of questions of one of three kinds:
//! - `Categorize`: items to be sorted into category buckets
//! - `Cloze`: text with `[token]` blanks to fill in
//! - `Comprehension`: a passage followed by sub-questions
//!
//! Question and answer payloads are tagged unions serialized as
//! `{"type": "...", "data": {...}}`, the shape the web client speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Title used when a form is saved without one.
pub const DEFAULT_FORM_TITLE: &str = "Untitled Form";

/// A stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    /// Build a freshly created form. Both timestamps are `now`.
    pub fn new(id: impl Into<String>, content: FormContent, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: content.title,
            description: content.description,
            header_image: content.header_image,
            questions: content.questions,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field with `content`.
    ///
    /// `id` and `created_at` are kept; `updated_at` never moves backwards.
    pub fn replace_content(&mut self, content: FormContent, now: DateTime<Utc>) {
        self.title = content.title;
        self.description = content.description;
        self.header_image = content.header_image;
        self.questions = content.questions;
        self.updated_at = now.max(self.updated_at);
    }

    pub fn summary(&self) -> FormSummary {
        FormSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            question_count: self.questions.len(),
        }
    }
}

/// List view of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub question_count: usize,
}

/// A single question inside a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
            kind,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }
}

/// Closed set of question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Categorize,
    Cloze,
    Comprehension,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Categorize => "categorize",
            QuestionType::Cloze => "cloze",
            QuestionType::Comprehension => "comprehension",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type-specific question payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum QuestionKind {
    Categorize(CategorizeData),
    Cloze(ClozeData),
    Comprehension(ComprehensionData),
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Categorize(_) => QuestionType::Categorize,
            QuestionKind::Cloze(_) => QuestionType::Cloze,
            QuestionKind::Comprehension(_) => QuestionType::Comprehension,
        }
    }
}

/// Category buckets and the items to sort into them.
///
/// Items are not linked to categories here; the link only exists in an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizeData {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Text with `[token]` blank markers and the expected answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClozeData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blanks: Vec<Blank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blank {
    pub id: u32,
    #[serde(default)]
    pub answer: String,
}

/// Reading passage followed by sub-questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComprehensionData {
    #[serde(default)]
    pub passage: String,
    #[serde(default)]
    pub questions: Vec<SubQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestion {
    pub id: u32,
    #[serde(default)]
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: SubQuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubQuestionType {
    #[default]
    Text,
    MultipleChoice,
    TrueFalse,
}

/// Mutable part of a form, after request defaults have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FormContent {
    pub title: String,
    pub description: String,
    pub header_image: Option<String>,
    pub questions: Vec<Question>,
}

/// Body of a create or update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub header_image: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

impl FormPayload {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.get_or_insert_with(Vec::new).push(question);
        self
    }

    /// Apply defaults: blank title becomes [`DEFAULT_FORM_TITLE`], missing
    /// description and questions become empty, questions without an id get
    /// `q_<position>`.
    pub fn into_content(self) -> FormContent {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FORM_TITLE.to_string());

        let mut questions = self.questions.unwrap_or_default();
        for (index, question) in questions.iter_mut().enumerate() {
            if question.id.is_empty() {
                question.id = format!("q_{}", index + 1);
            }
        }

        FormContent {
            title,
            description: self.description.unwrap_or_default(),
            header_image: self.header_image,
            questions,
        }
    }
}

/// A submitted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub form_id: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Response {
    pub fn new(id: impl Into<String>, content: ResponseContent, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            form_id: content.form_id,
            answers: content.answers,
            submitted_at: now,
            ip_address: content.client.ip_address,
            user_agent: content.client.user_agent,
        }
    }
}

/// One answer inside a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    #[serde(flatten)]
    pub kind: AnswerKind,
}

/// Type-specific answer payload, mirroring [`QuestionKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum AnswerKind {
    /// item label -> category label
    Categorize(BTreeMap<String, String>),
    /// blank index (as text) -> filled text
    Cloze(BTreeMap<String, String>),
    /// sub-question id (as text) -> answer text
    Comprehension(BTreeMap<String, String>),
}

impl AnswerKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerKind::Categorize(_) => QuestionType::Categorize,
            AnswerKind::Cloze(_) => QuestionType::Cloze,
            AnswerKind::Comprehension(_) => QuestionType::Comprehension,
        }
    }
}

/// Body of a submit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub form_id: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Who submitted a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A response ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContent {
    pub form_id: String,
    pub answers: Vec<Answer>,
    pub client: ClientInfo,
}

/// Query for the paginated response listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseQuery {
    #[serde(default, deserialize_with = "lenient_count")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: Option<usize>,
    pub form_id: Option<String>,
}

/// Query numbers that fail to parse (`page=abc`, `limit=-1`) count as unset.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

impl ResponseQuery {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePage {
    pub responses: Vec<Response>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_wire_format() {
        let question: Question = serde_json::from_value(json!({
            "id": "q1",
            "type": "cloze",
            "title": "Fill in",
            "data": { "text": "A [cat] sat.", "blanks": [{ "id": 1, "answer": "cat" }] }
        }))
        .unwrap();

        assert_eq!(question.question_type(), QuestionType::Cloze);
        match &question.kind {
            QuestionKind::Cloze(data) => {
                assert_eq!(data.blanks.len(), 1);
                assert_eq!(data.blanks[0].answer, "cat");
            }
            other => panic!("expected cloze, got {:?}", other),
        }

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "cloze");
        assert_eq!(value["data"]["text"], "A [cat] sat.");
        assert!(value.get("image").is_none());
    }

    #[test]
    fn test_unknown_question_type_rejected() {
        let result: serde_json::Result<Question> = serde_json::from_value(json!({
            "id": "q1", "type": "essay", "title": "?", "data": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_comprehension_sub_question_types() {
        let data: ComprehensionData = serde_json::from_value(json!({
            "passage": "Rust was first released in 2015.",
            "questions": [
                { "id": 1, "question": "When?", "type": "text" },
                { "id": 2, "question": "Pick", "type": "multiple-choice", "options": ["2010", "2015"], "correctAnswer": "2015" },
                { "id": 3, "question": "Stable?", "type": "true-false" }
            ]
        }))
        .unwrap();

        assert_eq!(data.questions[1].kind, SubQuestionType::MultipleChoice);
        assert_eq!(data.questions[1].correct_answer.as_deref(), Some("2015"));
        assert_eq!(data.questions[2].kind, SubQuestionType::TrueFalse);
    }

    #[test]
    fn test_answer_maps() {
        let answer: Answer = serde_json::from_value(json!({
            "questionId": "q1", "type": "cloze", "data": { "0": "cat", "1": "mat" }
        }))
        .unwrap();

        match answer.kind {
            AnswerKind::Cloze(map) => assert_eq!(map.get("1").map(String::as_str), Some("mat")),
            other => panic!("expected cloze answer, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_defaults() {
        let content = FormPayload::default()
            .with_question(Question::new("", "Sort", QuestionKind::Categorize(CategorizeData::default())))
            .into_content();

        assert_eq!(content.title, DEFAULT_FORM_TITLE);
        assert_eq!(content.description, "");
        assert_eq!(content.questions[0].id, "q_1");
    }

    #[test]
    fn test_replace_content_keeps_identity() {
        let created = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let mut form = Form::new("form_1", FormPayload::titled("Quiz").into_content(), created);

        let earlier = DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        form.replace_content(FormPayload::titled("Renamed").into_content(), earlier);

        assert_eq!(form.id, "form_1");
        assert_eq!(form.title, "Renamed");
        assert_eq!(form.created_at, created);
        assert_eq!(form.updated_at, created);
    }

    #[test]
    fn test_pagination_pages() {
        assert_eq!(Pagination::new(1, 20, 0).pages, 0);
        assert_eq!(Pagination::new(1, 20, 41).pages, 3);
        assert_eq!(ResponseQuery::default().limit(), 20);
        assert_eq!(ResponseQuery { page: Some(0), ..Default::default() }.page(), 1);
    }
}
