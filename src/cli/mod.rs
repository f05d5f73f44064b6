pub mod repl;

use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Relays chat messages to an LLM completion API", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    // --- Secrets ---
    /// API key for the completion provider. Required by every front end.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// Telegram bot token. Required by the `bot` front end.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true, global = true)]
    pub telegram_bot_token: Option<String>,

    // --- Chat LLM Provider Args ---
    /// Model name for chat completion (e.g., gpt-3.5-turbo, gpt-4o)
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-3.5-turbo", global = true)]
    pub chat_model: String,

    /// Base URL of an OpenAI-compatible API (e.g., https://api.openai.com)
    #[arg(long, env = "CHAT_BASE_URL", global = true)] // No default, let the client pick one
    pub chat_base_url: Option<String>,

    /// Upper bound on tokens generated per reply. Unset leaves it to the provider.
    #[arg(long, env = "CHAT_MAX_TOKENS", global = true)]
    pub chat_max_tokens: Option<u32>,

    /// Timeout in seconds for a single completion request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60", global = true)]
    pub request_timeout_secs: u64,

    // --- History Args ---
    /// Maximum stored messages per chat, system message included.
    #[arg(long, env = "MAX_HISTORY_LEN", default_value = "11", global = true)]
    pub max_history: usize,

    /// Overrides the system message sent at the start of every conversation.
    #[arg(long, env = "SYSTEM_PROMPT", global = true)]
    pub system_prompt: Option<String>,

    /// Path to a JSON prompt file with optional `system_message` and `greeting` fields.
    #[arg(long, env = "PROMPTS_PATH", global = true)]
    pub prompts_path: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false", global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat in the terminal.
    Chat,
    /// Telegram bot front end.
    Bot,
}
