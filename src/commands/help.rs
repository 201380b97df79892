// help.rs - Start / Help Command Module
// Greets the user in their language and explains what to send.

use crate::messenger::ChatId;
use serenity::{
    client::Context,
    framework::standard::{macros::command, CommandResult},
    model::channel::Message,
};

#[command]
#[aliases("help", "h")]
/// Display the greeting and usage hint
pub async fn start(ctx: &Context, msg: &Message) -> CommandResult {
    let Some(state) = crate::bot_state(ctx).await else {
        return Ok(());
    };
    let dispatcher = &state.dispatcher;
    let chat = ChatId(msg.channel_id.0);
    let language = dispatcher
        .sessions()
        .language(chat)
        .await
        .unwrap_or_else(|| dispatcher.catalog().default_language().to_string());

    let max_mb = (state.ceiling.get() / crate::config::MB).to_string();
    let text = dispatcher.catalog().render(&language, "start", None, &[("max_mb", max_mb)]);
    msg.reply(ctx, text).await?;
    Ok(())
}
