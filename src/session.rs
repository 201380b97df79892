// session.rs - Per-Chat Session State
// In-memory only; nothing here survives a restart.

use crate::messenger::ChatId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Session {
    pub language: Option<String>,
    pub last_request: Option<DateTime<Utc>>,
    pub total_requests: usize,
}

impl Session {
    fn new() -> Self {
        Self {
            language: None,
            last_request: None,
            total_requests: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<ChatId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn language(&self, chat: ChatId) -> Option<String> {
        self.sessions.read().await.get(&chat).and_then(|s| s.language.clone())
    }

    pub async fn set_language(&self, chat: ChatId, language: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(chat).or_insert_with(Session::new).language = Some(language.to_string());
    }

    /// Record a fetch request from this chat.
    pub async fn record_request(&self, chat: ChatId) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat).or_insert_with(Session::new);
        session.last_request = Some(Utc::now());
        session.total_requests += 1;
    }

    pub async fn get(&self, chat: ChatId) -> Option<Session> {
        self.sessions.read().await.get(&chat).cloned()
    }

    pub async fn active_chats(&self) -> usize {
        self.sessions.read().await.len()
    }
}
