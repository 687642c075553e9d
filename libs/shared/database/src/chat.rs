use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use shared_models::chat::ChatMessage;

use crate::supabase::SupabaseClient;

/// Append-only conversation audit log, keyed by session id.
#[async_trait]
pub trait ChatLog: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<()>;
    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>>;
}

pub struct SupabaseChatLog {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseChatLog {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ChatLog for SupabaseChatLog {
    async fn append(&self, message: ChatMessage) -> Result<()> {
        debug!("Appending chat message for session {}", message.session_id);

        let row = json!({
            "id": message.id,
            "session_id": message.session_id,
            "role": message.role.to_string(),
            "content": message.content,
            "timestamp": message.timestamp.to_rfc3339(),
        });

        let _: Value = self
            .supabase
            .request(Method::POST, "/rest/v1/chat_history", Some(row))
            .await?;
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let path = format!(
            "/rest/v1/chat_history?session_id=eq.{}&order=timestamp.asc",
            urlencoding::encode(session_id)
        );

        let rows: Vec<ChatMessage> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows)
    }
}

/// In-process chat log used in tests and when no database is configured.
#[derive(Default)]
pub struct MemoryChatLog {
    messages: Mutex<Vec<ChatMessage>>,
}

impl MemoryChatLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatLog for MemoryChatLog {
    async fn append(&self, message: ChatMessage) -> Result<()> {
        self.messages.lock().await.push(message);
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.lock().await;
        let mut matching: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);
        Ok(matching)
    }
}
