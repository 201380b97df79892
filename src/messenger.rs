// messenger.rs - Chat Platform Boundary
// The pipeline talks to the chat platform only through the Messenger trait.
// DiscordMessenger is the serenity-backed implementation used in production.

use crate::error::MessengerError;
use async_trait::async_trait;
use log::debug;
use serenity::http::Http;
use serenity::model::channel::AttachmentType;
use serenity::model::id::ChannelId;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// Discord's message content limit; longer titles are cut with an ellipsis.
const MAX_CAPTION_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub u64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound user text message, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat: ChatId,
    pub text: String,
    pub message_id: u64,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), MessengerError>;

    async fn send_video(&self, chat: ChatId, video: &Path, caption: &str) -> Result<(), MessengerError>;
}

pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn truncate_caption(caption: &str) -> String {
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return caption.to_string();
    }
    let mut cut: String = caption.chars().take(MAX_CAPTION_CHARS - 1).collect();
    cut.push('…');
    cut
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), MessengerError> {
        ChannelId(chat.0).say(&self.http, text).await?;
        Ok(())
    }

    async fn send_video(&self, chat: ChatId, video: &Path, caption: &str) -> Result<(), MessengerError> {
        let caption = truncate_caption(caption);
        debug!("[MESSENGER] Uploading {} to channel {}", video.display(), chat);
        ChannelId(chat.0)
            .send_files(&self.http, vec![AttachmentType::Path(video)], |m| m.content(&caption))
            .await?;
        Ok(())
    }
}
