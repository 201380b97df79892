mod commands;
mod config;
mod dispatcher;
mod error;
mod fetch;
mod messages;
mod messenger;
mod normalize;
mod platform;
mod policy;
mod reporter;
mod session;
mod tasks;
mod ytdlp;

#[cfg(test)]
mod testing;

use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    framework::standard::{macros::group, StandardFramework},
    model::gateway::Ready,
    prelude::GatewayIntents,
    prelude::TypeMapKey,
};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use serenity::model::channel::Message;

use crate::config::{load_bot_config, prepare_scratch_dir, MB};
use crate::dispatcher::RequestDispatcher;
use crate::fetch::{FetchExecutor, FetchSettings};
use crate::messages::MessageCatalog;
use crate::messenger::{ChatId, DiscordMessenger, InboundMessage};
use crate::policy::SizeCeiling;
use crate::reporter::OutcomeReporter;
use crate::session::SessionStore;
use crate::ytdlp::YtDlpExtractor;

// Everything commands and the event handler need, shared through the client's TypeMap
pub struct BotState {
    pub dispatcher: Arc<RequestDispatcher>,
    pub ceiling: SizeCeiling,
    pub owner_id: Option<u64>,
    pub prefix: String,
}

pub struct BotStateKey;
impl TypeMapKey for BotStateKey {
    type Value = Arc<BotState>;
}

pub async fn bot_state(ctx: &Context) -> Option<Arc<BotState>> {
    let data = ctx.data.read().await;
    let state = data.get::<BotStateKey>().cloned();
    if state.is_none() {
        log::error!("❌ Bot state not initialized - this indicates a startup ordering error");
    }
    state
}

// Import all command constants generated by the #[command] macro
use crate::commands::admin::{LIMIT_COMMAND, STATUS_COMMAND};
use crate::commands::help::START_COMMAND;
use crate::commands::lang::LANG_COMMAND;

// Command group declaration - includes all available commands
#[group]
#[commands(start, lang, limit, status)]
struct General;

/// Remove `<@id>` / `<@!id>` mentions of the bot from a guild message.
fn strip_mention(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@{}>", bot_id), "")
        .replace(&format!("<@!{}>", bot_id), "")
        .trim()
        .to_string()
}

// Event handler implementation
struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        println!("✅ Bot connected as {}!", ready.user.name);
        log::info!("📊 Connected to {} guilds", ready.guilds.len());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(state) = bot_state(&ctx).await else {
            return;
        };
        if msg.content.trim_start().starts_with(&state.prefix) {
            return;
        }

        // DMs are always links; in guilds only messages addressed to the bot are
        let text = if msg.is_private() {
            msg.content.clone()
        } else {
            let bot_id = ctx.cache.current_user_id();
            if !msg.mentions_user_id(bot_id) {
                return;
            }
            strip_mention(&msg.content, bot_id.0)
        };

        let inbound = InboundMessage {
            chat: ChatId(msg.channel_id.0),
            text,
            message_id: msg.id.0,
        };
        // Returns as soon as the acknowledgment is out; the fetch runs on its own task
        state.dispatcher.handle(inbound).await;
    }
}

async fn handle_command_line(state: Arc<BotState>, shutdown_tx: mpsc::Sender<String>) {
    use tokio::io::AsyncWriteExt;
    use tokio::time::{sleep, Duration};

    println!("📝 Command line interface active. Type 'help' for available commands.");

    // Let the connection banner print first
    sleep(Duration::from_millis(1500)).await;

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    loop {
        if stdout.write_all(b"> ").await.is_err() || stdout.flush().await.is_err() {
            eprintln!("❌ Failed to write prompt");
            break;
        }

        match reader.next_line().await {
            Ok(Some(line)) => {
                let command = line.trim().to_lowercase();

                match command.as_str() {
                    "quit" | "q" | "exit" => {
                        println!("⏹️  Shutting down bot...");
                        if shutdown_tx.send("quit".to_string()).await.is_err() {
                            eprintln!("❌ Failed to send shutdown signal");
                        }
                        break;
                    }
                    "help" | "h" => {
                        println!("🤖 Available commands:");
                        println!("  quit, q, exit  - Stop the bot gracefully");
                        println!("  help, h        - Show this help message");
                        println!("  status         - Show bot status");
                    }
                    "status" => {
                        println!("🤖 Bot Status: Running");
                        println!("📥 Fetches in flight: {}", state.dispatcher.in_flight());
                        println!("📦 Upload ceiling: {}MB", state.ceiling.get() / MB);
                        println!("💬 Known chats: {}", state.dispatcher.sessions().active_chats().await);
                    }
                    "" => {}
                    _ => {
                        println!("❓ Unknown command: '{}'. Type 'help' for available commands.", command);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("❌ Error reading command line: {}", e);
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let mut config = match load_bot_config() {
        Ok(config) => config,
        Err(error) => {
            log::error!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=^");
            return;
        }
    };

    let catalog = match MessageCatalog::load(&config.messages_file, &config.default_language) {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => {
            log::error!("❌ {}", error);
            eprintln!("❌ {}", error);
            return;
        }
    };
    println!("💬 Message languages: {}", catalog.languages().join(", "));

    config.scratch_dir = match prepare_scratch_dir(&config.scratch_dir) {
        Ok(dir) => dir,
        Err(e) => {
            log::error!("❌ {}", e);
            eprintln!("❌ {}", e);
            return;
        }
    };
    log::info!("📁 Scratch directory: {}", config.scratch_dir.display());

    let extractor = YtDlpExtractor::new(config.yt_dlp_path.clone());
    match extractor.probe_version().await {
        Ok(version) => println!("✅ yt-dlp version: {}", version),
        Err(e) => {
            log::warn!("⚠️ yt-dlp is not usable yet, every fetch will fail until it is: {}", e);
            eprintln!("⚠️ yt-dlp check failed: {}", e);
        }
    }

    println!("🤖 Starting bot with prefix: '{}'", config.prefix);
    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&config.prefix)
            .case_insensitivity(true)
            .with_whitespace(true)
        })
        .after(|_ctx, msg, command_name, result| Box::pin(async move {
            if let Err(e) = result {
                log::error!("❌ Command '{}' failed for user {} ({}): {:?}",
                           command_name, msg.author.name, msg.author.id, e);
            }
        }))
        .group(&GENERAL_GROUP);

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Error creating Discord client: {:?}", e);
            eprintln!("❌ Error creating Discord client: {:?}", e);
            eprintln!("Check your token in botconfig.txt file");
            return;
        }
    };

    // Wire the pipeline once the HTTP handle exists
    let ceiling = SizeCeiling::new(config.max_upload_bytes);
    let messenger = Arc::new(DiscordMessenger::new(client.cache_and_http.http.clone()));
    let executor = Arc::new(FetchExecutor::new(
        Box::new(extractor),
        ceiling.clone(),
        FetchSettings::from(&config),
    ));
    let reporter = Arc::new(OutcomeReporter::new(messenger.clone(), catalog.clone(), ceiling.clone()));
    let dispatcher = Arc::new(RequestDispatcher::new(
        messenger,
        executor,
        reporter,
        Arc::new(SessionStore::new()),
        catalog,
        config.max_concurrent_fetches,
    ));
    let state = Arc::new(BotState {
        dispatcher,
        ceiling,
        owner_id: config.owner_id,
        prefix: config.prefix.clone(),
    });
    {
        let mut data = client.data.write().await;
        data.insert::<BotStateKey>(state.clone());
    }
    println!(
        "📦 Upload ceiling {}MB, up to {} concurrent fetches",
        config.max_upload_bytes / MB,
        config.max_concurrent_fetches
    );

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<String>(1);
    let cmd_task = tokio::spawn(handle_command_line(state, shutdown_tx));

    println!("🚀 Bot is running...");
    println!("💡 Use 'quit' command to stop gracefully, or press Ctrl+C");
    tokio::select! {
        _ = signal::ctrl_c() => {
            println!("\n⏹️ Stopping bot gracefully...");
        }
        shutdown_signal = shutdown_rx.recv() => {
            if let Some(signal) = shutdown_signal {
                println!("📡 Received '{}' command, stopping bot gracefully...", signal);
            }
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
                eprintln!("❌ Client error: {:?}", why);
            }
        }
    }

    cmd_task.abort();
    println!("✅ Bot stopped");
}
