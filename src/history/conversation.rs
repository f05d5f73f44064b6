use crate::llm::chat::CompletionResponse;
use crate::llm::LlmError;
use crate::models::chat::{ ChatMessage, Role };

/// Ordered message history of one chat.
///
/// The first element is always the system message; every mutation below
/// keeps it in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_message: ChatMessage) -> Self {
        debug_assert_eq!(system_message.role, Role::System);
        Self { messages: vec![system_message] }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_message(&self) -> &ChatMessage {
        &self.messages[0]
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Removes the trailing user message left unanswered by a failed completion.
    ///
    /// Returns `false` without touching the history when the last message is
    /// not a user turn.
    pub fn rollback(&mut self) -> bool {
        match self.messages.last() {
            Some(last) if last.role == Role::User && self.messages.len() > 1 => {
                self.messages.pop();
                true
            }
            _ => false,
        }
    }

    /// Records the outcome of a completion attempt.
    ///
    /// On success the reply is appended and returned; on failure the pending
    /// user message is rolled back and the error handed back unchanged.
    pub fn apply_completion(
        &mut self,
        result: Result<CompletionResponse, LlmError>
    ) -> Result<String, LlmError> {
        match result {
            Ok(completion) => {
                self.push_assistant(completion.response.clone());
                Ok(completion.response)
            }
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    /// Keeps the system message plus the newest `max_len - 1` messages.
    ///
    /// Returns whether anything was dropped.
    pub fn truncate(&mut self, max_len: usize) -> bool {
        let max_len = max_len.max(1);
        if self.messages.len() <= max_len {
            return false;
        }
        let keep_from = self.messages.len() - (max_len - 1);
        self.messages.drain(1..keep_from);
        true
    }

    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }
}
