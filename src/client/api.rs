use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::session::{ChatMessage, Sender, SessionCache};
use super::storage::{SharedStorage, AUTH_TOKEN_KEY, PROFILE_KEY};
use crate::auth::AUTH_TOKEN_HEADER;
use crate::profile::Profile;

/// Shown in the transcript whenever a chat turn fails.
pub const APOLOGY_MESSAGE: &str =
    "I'm having trouble connecting right now, but I'm here for you. Can you try again?";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: AccountUser,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody<'a> {
    message: &'a str,
    user_profile: &'a Profile,
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

/// Browser-side calls to the JSON API. The session token lives in local storage.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    storage: SharedStorage,
}

impl ApiClient {
    pub fn new(base_url: &str, storage: SharedStorage) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(90)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            storage,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.storage.get(AUTH_TOKEN_KEY)?)
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        Ok(self.storage.remove(AUTH_TOKEN_KEY)?)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| "Something went wrong".to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ClientError> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        let payload: AuthPayload = self
            .send_json(self.http.post(self.url("/auth/register")).json(&body))
            .await?;
        self.storage.set(AUTH_TOKEN_KEY, &payload.token)?;
        Ok(payload)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let payload: AuthPayload = self
            .send_json(self.http.post(self.url("/auth/login")).json(&body))
            .await?;
        self.storage.set(AUTH_TOKEN_KEY, &payload.token)?;
        Ok(payload)
    }

    /// Pushes a completed profile to the account. Returns `false` without a
    /// request when no session token is stored.
    pub async fn save_profile(&self, profile: &Profile) -> Result<bool, ClientError> {
        let Some(token) = self.token()? else {
            return Ok(false);
        };
        let body = serde_json::json!({ "userProfile": profile });
        let _: serde_json::Value = self
            .send_json(
                self.http
                    .post(self.url("/user/profile"))
                    .header(AUTH_TOKEN_HEADER, token)
                    .json(&body),
            )
            .await?;
        Ok(true)
    }

    /// Onboarding hand-off: sync the profile if logged in, logging any failure.
    pub async fn sync_profile(&self, profile: &Profile) {
        match self.save_profile(profile).await {
            Ok(true) => debug!("profile saved to account"),
            Ok(false) => {}
            Err(e) => error!(error = %e, "error saving profile"),
        }
    }

    pub async fn chat(&self, message: &str, profile: &Profile) -> Result<String, ClientError> {
        let body = ChatBody {
            message,
            user_profile: profile,
        };
        let reply: ChatReply = self
            .send_json(self.http.post(self.url("/chat")).json(&body))
            .await?;
        Ok(reply.response)
    }
}

/// Outcome of one chat turn, as the transcript should render it.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub user: ChatMessage,
    pub reply: ChatMessage,
    /// Dismissible banner text when the turn failed.
    pub banner: Option<String>,
}

pub struct ChatSession {
    api: ApiClient,
    cache: SessionCache,
    storage: SharedStorage,
}

impl ChatSession {
    pub fn new(api: ApiClient, storage: SharedStorage) -> Self {
        let cache = SessionCache::load(storage.clone());
        Self {
            api,
            cache,
            storage,
        }
    }

    pub fn transcript(&self) -> &SessionCache {
        &self.cache
    }

    pub fn clear(&mut self) -> Result<(), ClientError> {
        Ok(self.cache.clear()?)
    }

    fn stored_profile(&self) -> Profile {
        match self.storage.get(PROFILE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored profile unreadable; sending empty profile");
                Profile::default()
            }),
            Ok(None) => Profile::default(),
            Err(e) => {
                warn!(error = %e, "could not read stored profile");
                Profile::default()
            }
        }
    }

    /// Sends one message. Blank input is ignored. A failed request still
    /// yields a turn: the apology reply plus a banner with the server's error.
    pub async fn send(&mut self, text: &str) -> Result<Option<ChatTurn>, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let profile = self.stored_profile();
        let user = self.cache.append(text, Sender::User)?;

        let turn = match self.api.chat(text, &profile).await {
            Ok(reply) => ChatTurn {
                user,
                reply: self.cache.append(reply, Sender::Ai)?,
                banner: None,
            },
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                ChatTurn {
                    user,
                    reply: self.cache.append(APOLOGY_MESSAGE, Sender::Ai)?,
                    banner: Some(e.to_string()),
                }
            }
        };
        Ok(Some(turn))
    }
}
