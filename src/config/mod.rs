pub mod prompt;

use crate::cli::{ Args, Command };
use crate::llm::LlmConfig;
use crate::replies::BOT_GREETING_TEMPLATE;
use prompt::{ load_prompts, PromptConfig, PromptError, BOT_SYSTEM_MESSAGE, CLI_SYSTEM_MESSAGE };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingSecret(&'static str),

    #[error("max history length must be at least 1")]
    InvalidHistoryLen,

    #[error("failed to load prompts: {0}")]
    Prompt(#[from] PromptError),
}

/// Validated runtime settings for one front end.
///
/// Holds the API key and bot token, so it is not `Debug`.
pub struct AppConfig {
    pub frontend: Command,
    pub llm: LlmConfig,
    pub telegram_bot_token: Option<String>,
    pub system_prompt: String,
    pub greeting_template: String,
    pub max_history_len: usize,
}

fn required_secret(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::MissingSecret(name))
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let api_key = required_secret(&args.openai_api_key, "OPENAI_API_KEY")?;
        let telegram_bot_token = match args.command {
            Command::Bot => Some(required_secret(&args.telegram_bot_token, "TELEGRAM_BOT_TOKEN")?),
            Command::Chat => None,
        };
        if args.max_history == 0 {
            return Err(ConfigError::InvalidHistoryLen);
        }

        let prompts = match &args.prompts_path {
            Some(path) => load_prompts(path)?,
            None => PromptConfig::default(),
        };
        let default_system = match args.command {
            Command::Chat => CLI_SYSTEM_MESSAGE,
            Command::Bot => BOT_SYSTEM_MESSAGE,
        };
        let system_prompt = args.system_prompt
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or(prompts.system_message)
            .unwrap_or_else(|| default_system.to_string());

        Ok(Self {
            frontend: args.command,
            llm: LlmConfig {
                api_key,
                completion_model: Some(args.chat_model.clone()),
                base_url: args.chat_base_url.clone().filter(|u| !u.trim().is_empty()),
                max_tokens: args.chat_max_tokens,
                timeout_secs: args.request_timeout_secs,
            },
            telegram_bot_token,
            system_prompt,
            greeting_template: prompts.greeting.unwrap_or_else(|| BOT_GREETING_TEMPLATE.to_string()),
            max_history_len: args.max_history,
        })
    }
}
