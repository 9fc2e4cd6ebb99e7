use chrono::Utc;
use serenity::{client::Client, prelude::GatewayIntents};
use std::sync::Arc;
use tokio::signal;

use tickets_worker::commands::default_catalog;
use tickets_worker::config::load_bot_config;
use tickets_worker::discord::Handler;

#[tokio::main]
async fn main() {
    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    // Load configuration from botconfig.txt file
    let config = match load_bot_config() {
        Ok(config) => {
            println!("✅ Configuration loaded from botconfig.txt");
            Arc::new(config)
        }
        Err(error) => {
            log::error!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=!");
            return;
        }
    };

    // A name or alias collision is a programming error, so refuse to start
    let catalog = match default_catalog(Utc::now()) {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => {
            log::error!("❌ Invalid command catalog: {}", error);
            eprintln!("❌ Invalid command catalog: {}", error);
            return;
        }
    };
    println!(
        "🤖 Starting bot with prefix '{}' and {} commands{}",
        config.prefix,
        catalog.len(),
        if config.whitelabel { " (whitelabel)" } else { "" }
    );

    // Configure bot intents
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    // Create and start client
    let mut client = match Client::builder(&config.token, intents)
        .event_handler(Handler::new(config.clone(), catalog))
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

    // Set up graceful shutdown on CTRL+C
    println!("🚀 Bot is running... Press Ctrl+C to stop");
    tokio::select! {
        _ = signal::ctrl_c() => {
            println!("\n⏹️ Stopping bot gracefully...");
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
                eprintln!("❌ Client error: {:?}", why);
            }
        }
    }

    client.shard_manager.lock().await.shutdown_all().await;
    println!("✅ Bot stopped");
}
