// admin.rs - Administrative commands for bot management
// ^limit changes the upload ceiling at runtime (owner only).
// ^status reports what the bot is doing right now.

use crate::config::MB;
use crate::messenger::ChatId;
use crate::session::Session;
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};

/// Parse a ceiling given in whole megabytes; returns the ceiling in bytes.
pub fn parse_limit_mb(raw: &str) -> Option<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|mb| *mb > 0)
        .and_then(|mb| mb.checked_mul(MB))
}

#[command]
#[aliases("ceiling", "maxsize")]
/// Change the upload size ceiling (owner only)
/// Supports:
///   - ^limit          (show current value)
///   - ^limit <MB>
pub async fn limit(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let Some(state) = crate::bot_state(ctx).await else {
        return Ok(());
    };

    if state.owner_id != Some(msg.author.id.0) {
        msg.reply(ctx, "❌ **Access Denied**\nThis command can only be used by the bot owner.").await?;
        return Ok(());
    }

    let raw = args.message().trim();
    if raw.is_empty() {
        msg.reply(ctx, format!("📦 Current upload ceiling: {}MB", state.ceiling.get() / MB)).await?;
        return Ok(());
    }

    match parse_limit_mb(raw) {
        Some(bytes) => {
            let previous = state.ceiling.get() / MB;
            let mb = bytes / MB;
            state.ceiling.set(bytes);
            println!("[ADMIN] Upload ceiling changed {}MB -> {}MB by {} ({})", previous, mb, msg.author.name, msg.author.id);
            msg.reply(ctx, format!("✅ Upload ceiling set to {}MB (was {}MB)", mb, previous)).await?;
        }
        None => {
            msg.reply(ctx, "❌ Usage: `^limit <megabytes>`, e.g. `^limit 25`").await?;
        }
    }
    Ok(())
}

/// One status line for the chat the command was issued in.
pub fn chat_summary(session: &Session) -> String {
    match session.last_request {
        Some(at) => format!(
            "\n🔗 This chat: {} links, last at {}",
            session.total_requests,
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => "\n🔗 This chat: no links yet".to_string(),
    }
}

#[command]
/// Show in-flight fetches, the ceiling and known chats
pub async fn status(ctx: &Context, msg: &Message) -> CommandResult {
    let Some(state) = crate::bot_state(ctx).await else {
        return Ok(());
    };

    let sessions = state.dispatcher.sessions();
    let mut text = format!(
        "🤖 **Bot Status**\n📥 Fetches in flight: {}\n📦 Upload ceiling: {}MB\n💬 Known chats: {}",
        state.dispatcher.in_flight(),
        state.ceiling.get() / MB,
        sessions.active_chats().await
    );
    if let Some(session) = sessions.get(ChatId(msg.channel_id.0)).await {
        text.push_str(&chat_summary(&session));
    }
    msg.reply(ctx, text).await?;
    Ok(())
}
