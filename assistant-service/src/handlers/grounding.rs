use super::completion::required_query;
use crate::models::CompletionQuery;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

/// `POST /bing-grounding?query=`
///
/// The body is always a string: the normalized JSON answer, the no-response
/// sentinel, or a formatted error message.
#[tracing::instrument(skip(state, params))]
pub async fn bing_grounding(
    State(state): State<AppState>,
    Query(params): Query<CompletionQuery>,
) -> Result<Json<String>, AppError> {
    let query = required_query(params)?;
    Ok(Json(state.agent.chat(&query).await))
}
