use crate::models::chat::DEFAULT_QUERY;
use crate::models::{ChatRequest, CompletionQuery};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// `GET /`: answer `query`, defaulting to a greeting.
pub async fn root(
    State(state): State<AppState>,
    Query(params): Query<CompletionQuery>,
) -> Json<String> {
    let query = params.query.unwrap_or_else(|| DEFAULT_QUERY.to_string());
    Json(state.completion.ask(&query).await)
}

/// `GET /completion?query=`
#[tracing::instrument(skip(state, params))]
pub async fn completion(
    State(state): State<AppState>,
    Query(params): Query<CompletionQuery>,
) -> Result<Json<String>, AppError> {
    let query = required_query(params)?;
    Ok(Json(state.completion.ask(&query).await))
}

/// `POST /chat` with `{"messages": [{"role", "content"}]}`
///
/// Body rejections go through [`AppError`] so every failure has the same JSON shape.
#[tracing::instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(request) = payload?;
    request.validate()?;
    Ok(Json(state.completion.complete(&request.messages).await))
}

/// Extract a non-blank `query` parameter.
pub(crate) fn required_query(params: CompletionQuery) -> Result<String, AppError> {
    match params.query {
        Some(query) if !query.trim().is_empty() => Ok(query),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "query parameter is required"
        ))),
    }
}
