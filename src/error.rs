use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Friendly text shown in the transcript when the provider fails for an unclassified reason.
pub const PROVIDER_FALLBACK_MESSAGE: &str =
    "Sorry, I had trouble connecting to my future self right now. Can you try again?";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token, authorization denied")]
    MissingToken,
    #[error("Token is not valid")]
    InvalidToken,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("User already exists")]
    DuplicateUser,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Language model API key not configured. Please add OPENAI_API_KEY to the .env file.")]
    ProviderConfig,
    #[error("Language model API quota exceeded. Please check the provider account billing.")]
    ProviderQuota,
    #[error("Invalid language model API key. Please check the .env file.")]
    ProviderAuth,
    /// Carries the provider detail for logs; clients only see the fallback message.
    #[error("provider request failed: {0}")]
    ProviderGeneric(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateUser | AppError::InvalidCredentials | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::Auth(_) | AppError::ProviderAuth => StatusCode::UNAUTHORIZED,
            AppError::ProviderQuota => StatusCode::TOO_MANY_REQUESTS,
            AppError::ProviderConfig | AppError::ProviderGeneric(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::ProviderGeneric(_) => PROVIDER_FALLBACK_MESSAGE.to_string(),
            AppError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        }

        let body = Json(json!({
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}
