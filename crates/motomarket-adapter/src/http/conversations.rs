/*
[INPUT]:  Conversation ids, listing ids and message text
[OUTPUT]: Conversations and messages
[POS]:    HTTP layer - messaging endpoints under /api/v1/conversations
[UPDATE]: When adding messaging endpoints or changing payloads
*/

use reqwest::Method;

use crate::http::{MarketClient, Result};
use crate::types::{Conversation, Message, SendMessageRequest, StartConversationRequest};

impl MarketClient {
    /// GET /api/v1/conversations
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let builder = self.request(Method::GET, "conversations")?;
        self.send_data(builder).await
    }

    /// GET /api/v1/conversations/{id}/messages
    pub async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let endpoint = format!("conversations/{conversation_id}/messages");
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_data(builder).await
    }

    /// Open a thread with a listing's seller
    ///
    /// POST /api/v1/conversations
    pub async fn start_conversation(&self, req: &StartConversationRequest) -> Result<Conversation> {
        let builder = self.request(Method::POST, "conversations")?.json(req);
        self.send_data(builder).await
    }

    /// POST /api/v1/conversations/{id}/messages
    pub async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message> {
        let endpoint = format!("conversations/{conversation_id}/messages");
        let builder = self
            .request(Method::POST, &endpoint)?
            .json(&SendMessageRequest {
                content: content.to_string(),
            });
        self.send_data(builder).await
    }

    /// PUT /api/v1/conversations/{id}/read
    pub async fn mark_conversation_read(&self, conversation_id: &str) -> Result<serde_json::Value> {
        let endpoint = format!("conversations/{conversation_id}/read");
        let builder = self.request(Method::PUT, &endpoint)?;
        Ok(self.send_envelope(builder).await?.data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::http::MarketClient;
    use crate::types::StartConversationRequest;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_start_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/conversations"))
            .and(body_json(serde_json::json!({
                "listing": "l1",
                "message": "Is it still available?",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "_id": "c1",
                    "listing": {"_id": "l1", "title": "Kawasaki Z400"},
                    "participants": ["u1", "u2"],
                    "unreadCount": 0,
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let conversation = client
            .start_conversation(&StartConversationRequest {
                listing: "l1".to_string(),
                message: "Is it still available?".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(conversation.id, "c1");
        assert_eq!(conversation.listing.id(), "l1");
        assert_eq!(conversation.participants.len(), 2);
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/conversations/c1/messages"))
            .and(body_json(serde_json::json!({"content": "Yes"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": {"_id": "m1", "conversation": "c1", "sender": "u2", "content": "Yes"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let message = client.send_message("c1", "Yes").await.unwrap();
        assert_eq!(message.sender.id(), "u2");
        assert!(!message.read);
    }
}
