//! Conversation history store.
//!
//! Append-only per-conversation message lists. Appends to the same
//! conversation from concurrent turns may interleave; each append is atomic
//! but turn-level ordering across tasks is not guaranteed.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crabdesk_core::{ConversationId, Message, Role};

/// In-memory conversation store.
#[derive(Default)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<ConversationId, Vec<Message>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full history for a conversation, empty if unknown.
    pub async fn history(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.conversations
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// History filtered to the roles that belong in an LLM prompt
    /// (system, user, assistant). Tool results stay internal to the
    /// billing loop and are excluded.
    pub async fn history_for_prompt(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.history(conversation_id)
            .await
            .into_iter()
            .filter(|m| matches!(m.role, Role::System | Role::User | Role::Assistant))
            .collect()
    }

    /// Append one message.
    pub async fn append(&self, conversation_id: &ConversationId, message: Message) {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation_id.clone())
            .or_default()
            .push(message);
    }

    /// Append several messages as one write.
    pub async fn append_all(&self, conversation_id: &ConversationId, messages: Vec<Message>) {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation_id.clone())
            .or_default()
            .extend(messages);
    }

    /// Drop a conversation entirely.
    pub async fn clear(&self, conversation_id: &ConversationId) {
        let removed = self.conversations.write().await.remove(conversation_id);
        if removed.is_some() {
            debug!(conversation_id = %conversation_id, "Cleared conversation");
        }
    }
}
