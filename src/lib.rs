pub mod bot;
pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod models;
pub mod replies;

use bot::BotRelay;
use cli::{ Args, Command };
use config::{ AppConfig, ConfigError };
use history::SessionManager;
use llm::chat::new_client as new_chat_client;
use llm::DEFAULT_BASE_URL;
use log::info;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::from_args(&args)?;

    info!("--- Core Configuration ---");
    info!("Front End: {:?}", config.frontend);
    info!("Chat Model: {}", config.llm.completion_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Base URL: {}", config.llm.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));
    info!("Max Tokens: {:?}", config.llm.max_tokens);
    info!("Request Timeout: {}s", config.llm.timeout_secs);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("-------------------------");

    let chat_client = new_chat_client(&config.llm)?;
    info!("Chat client initialized for model {}", chat_client.get_model());
    let sessions = Arc::new(
        SessionManager::new(chat_client, config.system_prompt.clone(), config.max_history_len)
    );
    info!("Max History Length: {}", sessions.max_len());

    match config.frontend {
        Command::Chat => {
            cli::repl::run_stdio(&sessions).await?;
        }
        Command::Bot => {
            let token = config.telegram_bot_token
                .as_deref()
                .ok_or(ConfigError::MissingSecret("TELEGRAM_BOT_TOKEN"))?;
            info!("Starting Telegram bot...");
            let relay = BotRelay::new(Arc::clone(&sessions), config.greeting_template.clone());
            bot::run(token, relay).await?;
        }
    }

    Ok(())
}
