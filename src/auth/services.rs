use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{jwt::JwtKeys, password, repo::UserStore, repo_types::User};
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A signed session token together with the user it was issued for.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Fails with `Validation` on bad input and `DuplicateUser` when the email is taken.
pub async fn register(
    store: &UserStore,
    keys: &JwtKeys,
    name: &str,
    email: &str,
    plain_password: &str,
) -> Result<Session, AppError> {
    let name = name.trim();
    let email = normalize_email(email);

    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if plain_password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation("Password too short".into()));
    }

    let hash = password::hash_blocking(plain_password.to_string()).await?;
    let user = store.insert(name, &email, hash).await.map_err(|e| {
        if matches!(e, AppError::DuplicateUser) {
            warn!(email = %email, "email already registered");
        }
        e
    })?;

    let token = keys.sign(user.id)?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Session { token, user })
}

pub async fn login(
    store: &UserStore,
    keys: &JwtKeys,
    email: &str,
    plain_password: &str,
) -> Result<Session, AppError> {
    let email = normalize_email(email);

    let Some(user) = store.find_by_email(&email).await else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let ok = password::verify_blocking(plain_password.to_string(), user.password_hash.clone())
        .await?;
    if !ok {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let user = store.touch_last_login(user.id).await?;
    let token = keys.sign(user.id)?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Session { token, user })
}
