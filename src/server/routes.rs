use axum::{
    extract::{
        ConnectInfo, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    Json,
    http::{HeaderMap, StatusCode, header},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::Error;
use crate::model::{
    ClientInfo, Form, FormPayload, FormSummary, Response, ResponsePage, ResponsePayload,
    ResponseQuery,
};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DemoResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub id: String,
    pub form_id: String,
    pub submitted_at: DateTime<Utc>,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// Map a storage error to an HTTP error. `failure` is the message shown
/// for anything that is not a client error.
fn storage_error(e: Error, failure: &str) -> ApiError {
    match e {
        Error::NotFound { entity, .. } => api_error(StatusCode::NOT_FOUND, format!("{} not found", entity)),
        Error::Validation(message) => api_error(StatusCode::BAD_REQUEST, message),
        other => {
            tracing::error!("{}: {}", failure, other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, failure)
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            api_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        } else {
            storage_error(Error::Validation(rejection.body_text()), "Invalid request body")
        }
    })
}

/// Client address (first `X-Forwarded-For` hop if present) and user agent.
fn client_info(addr: SocketAddr, headers: &HeaderMap) -> ClientInfo {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    ClientInfo {
        ip_address: Some(forwarded.unwrap_or_else(|| addr.ip().to_string())),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

pub async fn ping(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: state.ping_message.clone(),
    })
}

pub async fn demo() -> Json<DemoResponse> {
    Json(DemoResponse {
        message: "FormCraft API is working!".to_string(),
        timestamp: Utc::now(),
    })
}

// ========== Forms ==========

pub async fn list_forms(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<FormSummary>>> {
    let forms = state.storage.list_form_summaries().await
        .map_err(|e| storage_error(e, "Failed to fetch forms"))?;
    Ok(Json(forms))
}

pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Form>> {
    let form = state.storage.get_form(&id).await
        .map_err(|e| storage_error(e, "Failed to fetch form"))?;
    Ok(Json(form))
}

pub async fn create_form(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FormPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Form>)> {
    let payload = body(payload)?;
    let form = state.storage.create_form(payload).await
        .map_err(|e| storage_error(e, "Failed to create form"))?;
    Ok((StatusCode::CREATED, Json(form)))
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<FormPayload>, JsonRejection>,
) -> ApiResult<Json<Form>> {
    let payload = body(payload)?;
    let form = state.storage.update_form(&id, payload).await
        .map_err(|e| storage_error(e, "Failed to update form"))?;
    Ok(Json(form))
}

pub async fn delete_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.storage.delete_form(&id).await
        .map_err(|e| storage_error(e, "Failed to delete form"))?;
    Ok(Json(MessageResponse {
        message: "Form deleted successfully".to_string(),
    }))
}

// ========== Responses ==========

pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ResponsePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let payload = body(payload)?;
    let response = state.storage.submit_response(payload, client_info(addr, &headers)).await
        .map_err(|e| storage_error(e, "Failed to submit response"))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: response.id,
            form_id: response.form_id,
            submitted_at: response.submitted_at,
            message: "Response submitted successfully".to_string(),
        }),
    ))
}

pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ResponseQuery>, QueryRejection>,
) -> ApiResult<Json<ResponsePage>> {
    let Query(query) = query
        .map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;
    let page = state.storage.list_responses(&query).await
        .map_err(|e| storage_error(e, "Failed to fetch responses"))?;
    Ok(Json(page))
}

pub async fn responses_for_form(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
) -> ApiResult<Json<Vec<Response>>> {
    let responses = state.storage.responses_for_form(&form_id).await
        .map_err(|e| storage_error(e, "Failed to fetch responses"))?;
    Ok(Json(responses))
}

pub async fn get_response(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Response>> {
    let response = state.storage.get_response(&id).await
        .map_err(|e| storage_error(e, "Failed to fetch response"))?;
    Ok(Json(response))
}

pub async fn delete_response(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.storage.delete_response(&id).await
        .map_err(|e| storage_error(e, "Failed to delete response"))?;
    Ok(Json(MessageResponse {
        message: "Response deleted successfully".to_string(),
    }))
}
