use anyhow::Result;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{info, error};

mod bot;
mod commands;
mod config;
mod data;
mod db;
mod error;
mod handler;
mod rewards;
mod store;
mod streaks;
mod utils;

use bot::Bot;
use config::{Config, RewardBackend};
use handler::Handler;
use rewards::{LarkRewardSource, RewardSource, SqliteRewardSource};
use store::SqliteRecordStore;
use streaks::CheckinEngine;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging with environment-based configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "login_campaign_bot=info,serenity=warn".to_string())
        )
        .init();

    info!("Starting Login Campaign Bot...");

    let config = Config::from_env()?;

    let checkins_pool = db::open_pool(&config.checkins_db_path).await?;
    let store = SqliteRecordStore::new(checkins_pool).await?;

    let rewards: Arc<dyn RewardSource> = match &config.reward_backend {
        RewardBackend::Local { codes_db_path } => {
            info!("Using local reward table at {}", codes_db_path);
            let codes_pool = db::open_pool(codes_db_path).await?;
            Arc::new(SqliteRewardSource::new(codes_pool).await?)
        }
        RewardBackend::Lark(lark) => {
            info!("Using Lark reward table {}", lark.table_id);
            Arc::new(LarkRewardSource::new(lark.clone())?)
        }
    };

    let engine = CheckinEngine::new(Arc::new(store), rewards, config.grace_days);
    let token = config.discord_token.clone();
    let bot = Bot::new(engine, config);

    let intents = GatewayIntents::GUILDS;

    let handler = Handler { bot };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

    info!("Bot initialized successfully, connecting to Discord...");

    if let Err(why) = client.start().await {
        error!("Discord client error: {}", why);
        return Err(anyhow::anyhow!("Discord client failed: {}", why));
    }

    Ok(())
}
