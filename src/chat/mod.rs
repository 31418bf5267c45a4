use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod prompt;
pub mod provider;

pub use provider::{ChatCompletion, OpenAiProvider};

pub fn router() -> Router<AppState> {
    handlers::chat_routes()
}
