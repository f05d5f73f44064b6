mod conversation;

pub use conversation::Conversation;

use crate::llm::chat::ChatClient;
use crate::llm::{ FailureKind, LlmError };
use crate::models::chat::ChatMessage;
use log::{ info, warn, error };
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identifies one conversation thread (a Telegram chat id, or a fixed key for the CLI).
pub type ChatKey = i64;

/// One system message plus ten user/assistant turns.
pub const DEFAULT_MAX_HISTORY_LEN: usize = 11;

/// In-memory conversation store plus the policy that mutates it.
///
/// Each chat's history sits behind its own lock, so a whole exchange for one
/// chat is serialized while other chats proceed independently. Histories live
/// for the lifetime of the process.
pub struct SessionManager {
    client: Arc<dyn ChatClient>,
    system_message: ChatMessage,
    max_len: usize,
    conversations: Mutex<HashMap<ChatKey, Arc<Mutex<Conversation>>>>,
}

impl SessionManager {
    pub fn new(client: Arc<dyn ChatClient>, system_prompt: impl Into<String>, max_len: usize) -> Self {
        Self {
            client,
            system_message: ChatMessage::system(system_prompt),
            max_len: max_len.max(1),
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Number of chats that have a history.
    pub async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.lock().await.is_empty()
    }

    async fn entry(&self, chat: ChatKey) -> Arc<Mutex<Conversation>> {
        let mut conversations = self.conversations.lock().await;
        Arc::clone(
            conversations.entry(chat).or_insert_with(|| {
                info!("Initialized history for chat {}", chat);
                Arc::new(Mutex::new(Conversation::new(self.system_message.clone())))
            })
        )
    }

    /// Creates the history for `chat` if it does not exist yet.
    pub async fn ensure(&self, chat: ChatKey) {
        self.entry(chat).await;
    }

    pub async fn append_user(&self, chat: ChatKey, text: &str) {
        let conversation = self.entry(chat).await;
        conversation.lock().await.push_user(text);
    }

    /// Sends the stored history to the completion client.
    ///
    /// The reply is appended on success; on failure the trailing user message
    /// is rolled back before the error is returned.
    pub async fn complete(&self, chat: ChatKey) -> Result<String, LlmError> {
        let conversation = self.entry(chat).await;
        let mut conversation = conversation.lock().await;
        self.complete_locked(chat, &mut conversation).await
    }

    pub async fn truncate(&self, chat: ChatKey) {
        let conversation = self.entry(chat).await;
        let mut conversation = conversation.lock().await;
        self.truncate_locked(chat, &mut conversation);
    }

    pub async fn reset(&self, chat: ChatKey) {
        let conversation = self.entry(chat).await;
        conversation.lock().await.reset();
        info!("History for chat {} was reset", chat);
    }

    /// Runs one full turn for `chat`: append the user text, ask the model,
    /// settle the result and trim the history, all under the chat's lock.
    pub async fn exchange(&self, chat: ChatKey, text: &str) -> Result<String, LlmError> {
        let conversation = self.entry(chat).await;
        let mut conversation = conversation.lock().await;

        conversation.push_user(text);
        let result = self.complete_locked(chat, &mut conversation).await;
        self.truncate_locked(chat, &mut conversation);
        result
    }

    /// Copy of the stored history, or `None` if the chat was never seen.
    pub async fn snapshot(&self, chat: ChatKey) -> Option<Vec<ChatMessage>> {
        let conversation = {
            let conversations = self.conversations.lock().await;
            conversations.get(&chat).cloned()?
        };
        let conversation = conversation.lock().await;
        Some(conversation.messages().to_vec())
    }

    async fn complete_locked(
        &self,
        chat: ChatKey,
        conversation: &mut Conversation
    ) -> Result<String, LlmError> {
        let result = self.client.complete(conversation.messages()).await;
        let outcome = conversation.apply_completion(result);
        if let Err(e) = &outcome {
            match e.kind() {
                FailureKind::RateLimited => {
                    warn!("Completion for chat {} was rate limited: {}", chat, e)
                }
                kind => error!("Completion for chat {} failed ({}): {}", chat, kind, e),
            }
        }
        outcome
    }

    fn truncate_locked(&self, chat: ChatKey, conversation: &mut Conversation) {
        if conversation.truncate(self.max_len) {
            info!("History for chat {} was truncated to {} messages", chat, self.max_len);
        }
    }
}
