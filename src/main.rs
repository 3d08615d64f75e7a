mod address;
mod checker;
mod commands;
mod config;
mod gauge;
mod store;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use checker::AlertSink;
use config::Config;
use gauge::RpcGaugeReader;
use store::Store;

struct BotState {
    store: Mutex<Store>,
    reader: RpcGaugeReader,
}

/// Sends checker alerts through the bot. Chat ids are stored as decimal
/// strings; an unparseable key is logged and skipped.
struct TelegramSink {
    bot: Bot,
}

impl AlertSink for TelegramSink {
    async fn send_alert(&self, chat_id: &str, text: &str) -> Result<(), String> {
        let id: i64 = chat_id
            .parse()
            .map_err(|_| format!("bad chat id in store: '{chat_id}'"))?;
        self.bot
            .send_message(ChatId(id), text)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send: {e}"))
    }
}

#[tokio::main]
async fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let check_once = args.iter().any(|a| a == "--check-once");
    args.retain(|a| a != "--check-once");
    let config_path = args
        .into_iter()
        .next()
        .unwrap_or_else(|| "gaugewatch.json".to_string());

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("gaugewatch.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting gaugewatch...");
    info!("Loaded config from {config_path}");

    // A corrupt state file is a startup abort, not something to limp past.
    let store = match Store::load(config.state_path()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load reminder store: {e}");
            std::process::exit(1);
        }
    };

    let reader = RpcGaugeReader::new(config.rpc_url.clone());
    let bot = Bot::new(&config.telegram_bot_token);

    if check_once {
        // One-shot batch check; periodicity is up to the external timer.
        let sink = TelegramSink { bot };
        let sent = checker::run_once(&store, &reader, &sink).await;
        info!("one-shot check done ({sent} alert(s)), exiting");
        return;
    }

    info!("serving commands (rpc: {})", config.rpc_url);
    let state = Arc::new(BotState {
        store: Mutex::new(store),
        reader,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }

    let chat_id = msg.chat.id.0.to_string();
    let reply = {
        let mut store = state.store.lock().await;
        match commands::handle_command(&mut store, &state.reader, &chat_id, text).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return Ok(()),
            Err(e) => {
                // Persistence failure aborts this command only.
                error!("command in chat {chat_id} aborted: {e}");
                return Ok(());
            }
        }
    };

    if let Err(e) = bot.send_message(msg.chat.id, reply).await {
        warn!("Failed to send reply to chat {chat_id}: {e}");
    }
    Ok(())
}
