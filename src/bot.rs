use std::time::Duration;

use teloxide::adaptors::throttle::Limits;
use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::Bot;

use crate::config::AppConfig;
use crate::error::{BotError, BotResult, HandlerResult};
use crate::handler::get_handler;
use crate::state::AppState;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct BotService {
    pub bot: Throttle<Bot>,
    pub state: AppState,
}

impl BotService {
    pub async fn new(config: &AppConfig) -> BotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BotError::Other(e.into()))?;

        let bot = Bot::with_client(config.telegram.0.clone(), client).throttle(Limits::default());

        info!("Initializing AppState...");
        let state = AppState::new(config).await?;
        info!("AppState initialized");

        Ok(Self { bot, state })
    }

    pub async fn start(&self) -> HandlerResult<()> {
        info!("Testing connection to Telegram API...");
        match self.bot.get_me().await {
            Ok(me) => info!("Successfully connected to Telegram API as @{}", me.username()),
            Err(e) => {
                error!("Failed to connect to Telegram API: {:?}", e);
                return Err(anyhow::anyhow!("Failed to connect to Telegram API: {}", e).into());
            }
        }

        crate::command::setup_user_commands(&self.bot).await?;

        Dispatcher::builder(self.bot.clone(), get_handler::<Throttle<Bot>>())
            .dependencies(dptree::deps![self.state.clone()])
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
