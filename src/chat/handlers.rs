use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ChatRequest, ChatResponse},
    prompt::build_system_prompt,
};
use crate::{error::AppError, state::AppState};

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

/// Relays one message to the language model in the persona built from the profile.
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload.map_err(AppError::from)?;

    let system_prompt = build_system_prompt(&payload.user_profile);
    let response = state
        .llm
        .complete(&system_prompt, &payload.message)
        .await?;

    info!(reply_chars = response.chars().count(), "chat reply relayed");
    Ok(Json(ChatResponse { response }))
}
