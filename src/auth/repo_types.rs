use serde::Serialize;
use time::OffsetDateTime;

use crate::profile::Profile;

/// User record held by the in-memory store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,                      // sequential, first user is 1
    pub name: String,
    pub email: String,                // trimmed + lowercased, unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login: OffsetDateTime,
    pub profile: Profile,
}
