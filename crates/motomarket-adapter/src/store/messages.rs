/*
[INPUT]:  Conversation ids, listing ids and message text
[OUTPUT]: Conversation list, open thread and its messages
[POS]:    State layer - buyer/seller messaging store
[UPDATE]: When messaging flows or cached collections change
*/

use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::auth::AuthSession;
use crate::http::Result;
use crate::store::{HasStatus, OpStatus, read_lock, track, write_lock};
use crate::types::{Conversation, LastMessage, Message, StartConversationRequest};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageState {
    pub conversations: Vec<Conversation>,
    pub current_conversation: Option<Conversation>,
    /// Messages of the open thread
    pub messages: Vec<Message>,
    pub status: OpStatus,
}

impl HasStatus for MessageState {
    fn status_mut(&mut self) -> &mut OpStatus {
        &mut self.status
    }
}

#[derive(Debug, Clone)]
pub struct MessageStore {
    session: AuthSession,
    state: Arc<RwLock<MessageState>>,
}

impl MessageStore {
    pub fn new(session: AuthSession) -> Self {
        Self {
            session,
            state: Arc::new(RwLock::new(MessageState::default())),
        }
    }

    pub fn state(&self) -> MessageState {
        read_lock(&self.state).clone()
    }

    /// Total unread messages across cached conversations
    pub fn unread_total(&self) -> u32 {
        read_lock(&self.state)
            .conversations
            .iter()
            .map(|c| c.unread_count)
            .sum()
    }

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        self.session.require_user_id()?;
        track(
            &self.state,
            "Could not load conversations. Please try again.",
            async {
                let conversations = self.session.client().list_conversations().await?;
                write_lock(&self.state).conversations = conversations.clone();
                Ok(conversations)
            },
        )
        .await
    }

    /// Load a thread and make it the open one
    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        track(&self.state, "Could not load messages. Please try again.", async {
            let messages = self.session.client().list_messages(conversation_id).await?;
            let mut guard = write_lock(&self.state);
            guard.messages = messages.clone();
            guard.current_conversation = guard
                .conversations
                .iter()
                .find(|c| c.id == conversation_id)
                .cloned();
            Ok(messages)
        })
        .await
    }

    pub async fn start_conversation(
        &self,
        listing_id: &str,
        initial_message: &str,
    ) -> Result<Conversation> {
        let req = StartConversationRequest {
            listing: listing_id.to_string(),
            message: initial_message.to_string(),
        };
        track(
            &self.state,
            "Could not start the conversation. Please try again.",
            async {
                let conversation = self.session.client().start_conversation(&req).await?;
                write_lock(&self.state)
                    .conversations
                    .push(conversation.clone());
                Ok(conversation)
            },
        )
        .await
    }

    /// Send a message; the thread's preview is updated locally
    pub async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message> {
        track(&self.state, "Could not send the message. Please try again.", async {
            let message = self
                .session
                .client()
                .send_message(conversation_id, content)
                .await?;
            let sender = self
                .session
                .current_user()
                .map(|user| user.id)
                .unwrap_or_else(|| message.sender.id().to_string());

            let mut guard = write_lock(&self.state);
            guard.messages.push(message.clone());
            if let Some(conversation) = guard
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation_id)
            {
                conversation.last_message = Some(LastMessage {
                    content: content.to_string(),
                    sender,
                    created_at: Utc::now(),
                });
            }
            Ok(message)
        })
        .await
    }

    pub async fn mark_as_read(&self, conversation_id: &str) -> Result<serde_json::Value> {
        track(
            &self.state,
            "Could not mark as read. Please try again.",
            async {
                let data = self
                    .session
                    .client()
                    .mark_conversation_read(conversation_id)
                    .await?;
                let mut guard = write_lock(&self.state);
                if let Some(conversation) = guard
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == conversation_id)
                {
                    conversation.unread_count = 0;
                }
                Ok(data)
            },
        )
        .await
    }
}
