//! Behaviour every `Store` must share, run against each backend's tests.

use std::collections::BTreeMap;

use super::Store;
use crate::model::{
    Answer, AnswerKind, Blank, ClientInfo, ClozeData, FormPayload, Question, QuestionKind,
    ResponseContent,
};

pub(crate) async fn run_all(store: &dyn Store) {
    create_then_get(store).await;
    cloze_question_round_trip(store).await;
    update_keeps_identity(store).await;
    update_missing_form(store).await;
    delete_then_get(store).await;
    list_sorted_by_updated_at(store).await;
    responses_lifecycle(store).await;
}

fn cloze_question() -> Question {
    Question::new(
        "q1",
        "Fill the blank",
        QuestionKind::Cloze(ClozeData {
            text: "A [cat] sat.".into(),
            blanks: vec![Blank { id: 1, answer: "cat".into() }],
        }),
    )
}

async fn create_then_get(store: &dyn Store) {
    let mut payload = FormPayload::titled("Survey");
    payload.description = Some("About pets".into());
    payload.header_image = Some("https://example.com/header.png".into());
    let content = payload.into_content();

    let created = store.create_form(content.clone()).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = store.get_form(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.title, content.title);
    assert_eq!(fetched.description, content.description);
    assert_eq!(fetched.header_image, content.header_image);
}

async fn cloze_question_round_trip(store: &dyn Store) {
    let created = store
        .create_form(FormPayload::titled("Quiz").with_question(cloze_question()).into_content())
        .await
        .unwrap();

    let stored = store.get_form(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.questions.len(), 1);
    match &stored.questions[0].kind {
        QuestionKind::Cloze(data) => {
            assert_eq!(data.blanks.len(), 1);
            assert_eq!(data.blanks[0].answer, "cat");
        }
        other => panic!("expected cloze question, got {:?}", other),
    }
}

async fn update_keeps_identity(store: &dyn Store) {
    let created = store.create_form(FormPayload::titled("Draft").into_content()).await.unwrap();

    let mut payload = FormPayload::titled("Final").with_question(cloze_question());
    payload.description = Some("Ready".into());
    let updated = store.update_form(&created.id, payload.into_content()).await.unwrap().unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.questions.len(), 1);

    // Full replace: fields absent from the payload are reset, not merged.
    let replaced = store
        .update_form(&created.id, FormPayload::titled("Bare").into_content())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.description, "");
    assert!(replaced.questions.is_empty());
    assert!(replaced.updated_at >= updated.updated_at);

    assert_eq!(store.get_form(&created.id).await.unwrap().unwrap(), replaced);
}

async fn update_missing_form(store: &dyn Store) {
    let result = store
        .update_form("does-not-exist", FormPayload::titled("Nope").into_content())
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(store.get_form("does-not-exist").await.unwrap().is_none());
}

async fn delete_then_get(store: &dyn Store) {
    let created = store.create_form(FormPayload::titled("Temporary").into_content()).await.unwrap();
    assert!(store.delete_form(&created.id).await.unwrap());
    assert!(store.get_form(&created.id).await.unwrap().is_none());
    assert!(!store.delete_form(&created.id).await.unwrap());
}

async fn list_sorted_by_updated_at(store: &dyn Store) {
    let first = store.create_form(FormPayload::titled("First").into_content()).await.unwrap();
    store.create_form(FormPayload::titled("Second").into_content()).await.unwrap();
    store.update_form(&first.id, FormPayload::titled("First again").into_content()).await.unwrap();

    let forms = store.list_forms().await.unwrap();
    assert!(!forms.is_empty());
    assert!(forms.windows(2).all(|w| w[0].updated_at >= w[1].updated_at));
}

async fn responses_lifecycle(store: &dyn Store) {
    let form = store.create_form(FormPayload::titled("Feedback").into_content()).await.unwrap();
    let other = store.create_form(FormPayload::titled("Other").into_content()).await.unwrap();

    let mut filled = BTreeMap::new();
    filled.insert("0".to_string(), "cat".to_string());
    let answers = vec![Answer {
        question_id: "q1".into(),
        kind: AnswerKind::Cloze(filled),
    }];

    let submitted = store
        .create_response(ResponseContent {
            form_id: form.id.clone(),
            answers: answers.clone(),
            client: ClientInfo {
                ip_address: Some("127.0.0.1".into()),
                user_agent: Some("tests".into()),
            },
        })
        .await
        .unwrap();
    store
        .create_response(ResponseContent {
            form_id: other.id.clone(),
            answers: Vec::new(),
            client: ClientInfo::default(),
        })
        .await
        .unwrap();

    let fetched = store.get_response(&submitted.id).await.unwrap().unwrap();
    assert_eq!(fetched, submitted);
    assert_eq!(fetched.answers, answers);
    assert_eq!(fetched.ip_address.as_deref(), Some("127.0.0.1"));

    let for_form = store.list_responses(Some(&form.id)).await.unwrap();
    assert_eq!(for_form.len(), 1);
    assert_eq!(for_form[0].id, submitted.id);

    let all = store.list_responses(None).await.unwrap();
    assert!(all.len() >= 2);
    assert!(all.windows(2).all(|w| w[0].submitted_at >= w[1].submitted_at));

    // Deleting the form leaves its responses in place.
    assert!(store.delete_form(&form.id).await.unwrap());
    assert!(store.get_response(&submitted.id).await.unwrap().is_some());

    assert!(store.delete_response(&submitted.id).await.unwrap());
    assert!(store.get_response(&submitted.id).await.unwrap().is_none());
    assert!(!store.delete_response(&submitted.id).await.unwrap());

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.backend, store.kind());
    assert!(stats.forms >= 1);
    assert!(stats.responses >= 1);
}
