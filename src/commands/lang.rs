// lang.rs - Language Preference Command Module
// ^lang <code> switches the copy used for this chat's replies.
// The choice is kept in memory only.

use crate::messenger::ChatId;
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};

#[command]
#[aliases("language")]
/// Set the reply language for this chat
/// Supports:
///   - ^lang <code>
pub async fn lang(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let Some(state) = crate::bot_state(ctx).await else {
        return Ok(());
    };
    let catalog = state.dispatcher.catalog();
    let sessions = state.dispatcher.sessions();
    let chat = ChatId(msg.channel_id.0);
    let requested = args.message().trim().to_lowercase();

    if catalog.has_language(&requested) {
        sessions.set_language(chat, &requested).await;
        log::info!("[LANG] Chat {} switched to '{}'", chat, requested);
        msg.reply(ctx, catalog.text(&requested, "lang_set")).await?;
    } else {
        let current = sessions
            .language(chat)
            .await
            .unwrap_or_else(|| catalog.default_language().to_string());
        let text = catalog.render(&current, "lang_unknown", None, &[("languages", catalog.languages().join(", "))]);
        msg.reply(ctx, text).await?;
    }
    Ok(())
}
