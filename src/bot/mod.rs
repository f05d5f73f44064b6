//! Telegram front end.
//!
//! Commands `/start` and `/reset` restart the chat's history; any other
//! text is relayed to the model. Failures are reported back to the chat and
//! never stop the dispatcher.

use crate::history::{ ChatKey, SessionManager };
use crate::replies::{ failure_message, BOT_RESET_DONE };
use log::{ info, warn, error, debug };
use std::error::Error;
use std::sync::Arc;
use teloxide::dispatching::{ HandlerExt, UpdateFilterExt, UpdateHandler };
use teloxide::prelude::*;
use teloxide::types::{ ChatAction, ParseMode, User };
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const LOG_PREVIEW_CHARS: usize = 50;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum BotCommand {
    #[command(description = "greet and start a new conversation.")]
    Start,
    #[command(description = "forget the conversation so far.")]
    Reset,
}

/// Chat-facing behaviour of the bot, independent of the Telegram transport.
pub struct BotRelay {
    sessions: Arc<SessionManager>,
    greeting_template: String,
}

impl BotRelay {
    pub fn new(sessions: Arc<SessionManager>, greeting_template: impl Into<String>) -> Self {
        Self { sessions, greeting_template: greeting_template.into() }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Resets the chat and returns the HTML greeting for the user.
    pub async fn start(&self, chat: ChatKey, mention_html: &str) -> String {
        self.sessions.reset(chat).await;
        self.greeting_template.replace("{mention}", mention_html)
    }

    pub async fn reset(&self, chat: ChatKey) -> &'static str {
        self.sessions.reset(chat).await;
        BOT_RESET_DONE
    }

    /// Relays `text` to the model and returns what should be sent back:
    /// the reply, or the fixed message for the failure class.
    pub async fn reply_to_text(&self, chat: ChatKey, text: &str) -> String {
        info!("Received message from chat {}: '{}'", chat, text);
        match self.sessions.exchange(chat, text).await {
            Ok(reply) => {
                info!("Reply for chat {}: '{}...'", chat, preview(&reply));
                reply
            }
            Err(e) => {
                let kind = e.kind();
                if kind.is_fatal() {
                    error!("Completion provider rejected the API key; check the configuration ({})", e);
                }
                failure_message(kind).to_string()
            }
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

pub fn mention_html(user: &User) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user.id, html::escape(&user.full_name()))
}

/// Plain text that is not a command goes to the model.
pub fn is_relayable(text: Option<&str>) -> bool {
    matches!(text, Some(t) if !t.starts_with('/') && !t.trim().is_empty())
}

/// Splits a reply into chunks of at most `limit` UTF-16 code units, the unit
/// Telegram measures message length in. Characters are never cut in half.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut units = 0;
    for c in text.chars() {
        let width = c.len_utf16();
        if units + width > limit {
            chunks.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += width;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    Update::filter_message()
        .branch(dptree::entry().filter_command::<BotCommand>().endpoint(handle_command))
        .branch(dptree::filter(|msg: Message| is_relayable(msg.text())).endpoint(handle_text))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    relay: Arc<BotRelay>
) -> HandlerResult {
    let chat = msg.chat.id.0;
    match cmd {
        BotCommand::Start => {
            let mention = match msg.from.as_ref() {
                Some(user) => {
                    info!("User {} (ID: {}) started the bot in chat {}", user.first_name, user.id.0, chat);
                    mention_html(user)
                }
                None => html::escape("друг"),
            };
            let greeting = relay.start(chat, &mention).await;
            bot.send_message(msg.chat.id, greeting).parse_mode(ParseMode::Html).await?;
        }
        BotCommand::Reset => {
            let confirmation = relay.reset(chat).await;
            bot.send_message(msg.chat.id, confirmation).await?;
        }
    }
    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, relay: Arc<BotRelay>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Err(e) = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await {
        warn!("Failed to send typing action to chat {}: {}", msg.chat.id.0, e);
    }

    let reply = relay.reply_to_text(msg.chat.id.0, text).await;
    for chunk in split_message(&reply, TELEGRAM_MESSAGE_LIMIT) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

/// Verifies the token and serves updates until interrupted.
pub async fn run(token: &str, relay: BotRelay) -> Result<(), Box<dyn Error + Send + Sync>> {
    let bot = Bot::new(token);
    let me = bot.get_me().await?;
    info!("Bot @{} is running and accepting messages", me.username());

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![Arc::new(relay)])
        .default_handler(|update| async move {
            debug!("Ignoring update {:?}", update.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch().await;

    info!("Bot stopped");
    Ok(())
}
