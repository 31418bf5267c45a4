use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, ProfileUpdateRequest, ProfileUpdateResponse, PublicUser,
            RegisterRequest, UserDetails, UserSummary,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/user", get(get_me))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", post(update_profile))
        .route("/users", get(list_users))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload.map_err(AppError::from)?;
    let keys = JwtKeys::from_ref(&state);
    let session = services::register(
        &state.users,
        &keys,
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PublicUser::from(&session.user),
            token: session.token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload.map_err(AppError::from)?;
    let keys = JwtKeys::from_ref(&state);
    let session = services::login(&state.users, &keys, &payload.email, &payload.password).await?;

    Ok(Json(AuthResponse {
        user: PublicUser::from(&session.user),
        token: session.token,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserDetails>, AppError> {
    let user = state.users.find_by_id(user_id).await?;
    Ok(Json(UserDetails::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<ProfileUpdateResponse>, AppError> {
    let Json(payload) = payload.map_err(AppError::from)?;
    // A token can outlive its user; that surfaces as a failed update.
    let user_profile = state
        .users
        .update_profile(user_id, payload.user_profile)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "profile update failed");
            AppError::Internal(anyhow::anyhow!(e.to_string()))
        })?;

    info!(user_id, "profile updated");
    Ok(Json(ProfileUpdateResponse {
        success: true,
        user_profile,
    }))
}

/// Demo listing; intentionally unauthenticated.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserSummary>> {
    let users = state.users.list().await;
    Json(users.into_iter().map(UserSummary::from).collect())
}
