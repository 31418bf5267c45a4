use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, warn};

use super::storage::{SharedStorage, CHAT_HISTORY_KEY};

/// Most messages kept in storage.
pub const MAX_STORED_MESSAGES: usize = 50;
/// Messages shown again when the chat page loads.
pub const REPLAY_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Chat transcript persisted to local storage after every append.
pub struct SessionCache {
    storage: SharedStorage,
    history: Vec<ChatMessage>,
}

impl SessionCache {
    /// Reads the stored transcript. An unreadable transcript starts the session empty.
    pub fn load(storage: SharedStorage) -> Self {
        let history = match storage.get(CHAT_HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<ChatMessage>>(&raw).unwrap_or_else(|e| {
                error!(error = %e, "error loading chat history");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "error reading chat history");
                Vec::new()
            }
        };
        Self { storage, history }
    }

    /// The most recent messages to render on load. Pure data: nothing is re-sent or re-spoken.
    pub fn replay(&self) -> &[ChatMessage] {
        let start = self.history.len().saturating_sub(REPLAY_COUNT);
        &self.history[start..]
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn append(&mut self, text: impl Into<String>, sender: Sender) -> anyhow::Result<ChatMessage> {
        let message = ChatMessage {
            text: text.into(),
            sender,
            timestamp: OffsetDateTime::now_utc(),
        };
        self.push(message.clone())?;
        Ok(message)
    }

    /// Appends a message carrying its own timestamp, then truncates and persists.
    pub fn push(&mut self, message: ChatMessage) -> anyhow::Result<()> {
        self.history.push(message);
        if self.history.len() > MAX_STORED_MESSAGES {
            let overflow = self.history.len() - MAX_STORED_MESSAGES;
            self.history.drain(..overflow);
        }
        self.persist()
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.history.clear();
        self.storage.remove(CHAT_HISTORY_KEY)
    }

    fn persist(&self) -> anyhow::Result<()> {
        let raw = serde_json::to_string(&self.history)?;
        self.storage.set(CHAT_HISTORY_KEY, &raw).map_err(|e| {
            warn!(error = %e, "failed to persist chat history");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStorage;

    fn stored_len(storage: &SharedStorage) -> usize {
        let raw = storage.get(CHAT_HISTORY_KEY).unwrap().unwrap();
        serde_json::from_str::<Vec<ChatMessage>>(&raw).unwrap().len()
    }

    #[test]
    fn never_persists_more_than_fifty() {
        let storage = MemoryStorage::shared();
        let mut cache = SessionCache::load(storage.clone());
        for i in 0..50 {
            cache.append(format!("m{i}"), Sender::User).unwrap();
        }
        assert_eq!(stored_len(&storage), 50);
        assert_eq!(cache.history()[0].text, "m0");

        cache.append("m50", Sender::Ai).unwrap();
        assert_eq!(stored_len(&storage), 50);
        assert_eq!(cache.history()[0].text, "m1");
        assert_eq!(cache.history()[49].text, "m50");
    }

    #[test]
    fn reload_replays_last_ten_in_order() {
        let storage = MemoryStorage::shared();
        let mut cache = SessionCache::load(storage.clone());
        for i in 0..25 {
            let sender = if i % 2 == 0 { Sender::User } else { Sender::Ai };
            cache.append(format!("m{i}"), sender).unwrap();
        }

        let reloaded = SessionCache::load(storage);
        assert_eq!(reloaded.history().len(), 25);
        let texts: Vec<_> = reloaded.replay().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts.len(), 10);
        assert_eq!(texts.first(), Some(&"m15"));
        assert_eq!(texts.last(), Some(&"m24"));
    }

    #[test]
    fn short_history_replays_everything() {
        let storage = MemoryStorage::shared();
        let mut cache = SessionCache::load(storage);
        cache.append("only", Sender::System).unwrap();
        assert_eq!(cache.replay().len(), 1);
    }

    #[test]
    fn corrupt_history_starts_empty() {
        let storage = MemoryStorage::shared();
        storage.set(CHAT_HISTORY_KEY, "{not json").unwrap();
        let cache = SessionCache::load(storage);
        assert!(cache.history().is_empty());
    }

    #[test]
    fn wire_format_matches_browser_layout() {
        let storage = MemoryStorage::shared();
        let mut cache = SessionCache::load(storage.clone());
        cache.append("hi", Sender::Ai).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&storage.get(CHAT_HISTORY_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw[0]["sender"], "ai");
        assert_eq!(raw[0]["text"], "hi");
        let ts = raw[0]["timestamp"].as_str().unwrap();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn clear_removes_the_stored_transcript() {
        let storage = MemoryStorage::shared();
        let mut cache = SessionCache::load(storage.clone());
        cache.append("hi", Sender::User).unwrap();
        cache.clear().unwrap();
        assert!(storage.get(CHAT_HISTORY_KEY).unwrap().is_none());
        assert!(cache.history().is_empty());
    }
}
