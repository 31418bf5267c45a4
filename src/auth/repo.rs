use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo_types::User;
use crate::{error::AppError, profile::Profile};

#[derive(Debug, Default)]
struct Users {
    rows: Vec<User>,
    next_id: u64,
}

/// In-memory credential store, built once at startup and shared through `AppState`.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    inner: Arc<RwLock<Users>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user unless the email is taken. The existence check and the
    /// insert share one write guard, so concurrent registrations cannot both pass.
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: String,
    ) -> Result<User, AppError> {
        let mut users = self.inner.write().await;
        if users.rows.iter().any(|u| u.email == email) {
            return Err(AppError::DuplicateUser);
        }
        users.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: users.next_id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: now,
            last_login: now,
            profile: Profile::default(),
        };
        users.rows.push(user.clone());
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let users = self.inner.read().await;
        users.rows.iter().find(|u| u.email == email).cloned()
    }

    pub async fn find_by_id(&self, id: u64) -> Result<User, AppError> {
        let users = self.inner.read().await;
        users
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    pub async fn touch_last_login(&self, id: u64) -> Result<User, AppError> {
        let mut users = self.inner.write().await;
        let user = users
            .rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::UserNotFound)?;
        user.last_login = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    /// Replaces the stored profile wholesale.
    pub async fn update_profile(&self, id: u64, profile: Profile) -> Result<Profile, AppError> {
        let mut users = self.inner.write().await;
        let user = users
            .rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::UserNotFound)?;
        user.profile = profile;
        Ok(user.profile.clone())
    }

    pub async fn list(&self) -> Vec<User> {
        self.inner.read().await.rows.clone()
    }
}
