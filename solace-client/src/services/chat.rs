//! Support-assistant chat
//!
//! The conversation history is an array on the user's own document,
//! rewritten wholesale on each exchange. The assistant's replies arrive
//! as plain text and are normalized before display or storage.

use crate::gateway::{AnalysisGateway, DataGateway, DocPath, Query};
use crate::services::SessionState;
use crate::{Error, Result};
use serde_json::json;
use solace_common::model::{ChatSender, ChatTurn};
use solace_common::time;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opening turn seeded into an empty conversation
const GREETING: &str = "Hi! I'm your wellness assistant. How can I help you today?";

/// Shown when the assistant replies with nothing usable
const EMPTY_REPLY_FALLBACK: &str = "I'm here to support you. While I'm a demo bot right now, \
     I'm designed to provide guidance and support for your mental wellness journey.";

/// Shown when the reply request itself fails
const FAILURE_REPLY: &str =
    "Sorry, there was an issue processing your request. Please try again later.";

/// Normalize an assistant reply: trim, strip wrapping quotes, collapse
/// internal whitespace
fn clean_reply(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct ChatService {
    data: Arc<dyn DataGateway>,
    analysis: Arc<dyn AnalysisGateway>,
    session: Arc<SessionState>,
}

impl ChatService {
    pub fn new(
        data: Arc<dyn DataGateway>,
        analysis: Arc<dyn AnalysisGateway>,
        session: Arc<SessionState>,
    ) -> Self {
        ChatService {
            data,
            analysis,
            session,
        }
    }

    /// The conversation so far, seeding the greeting on first contact
    pub async fn history(&self) -> Result<Vec<ChatTurn>> {
        let uid = self.session.require_uid().await?;
        let turns = self.load_turns(&uid).await?;
        if !turns.is_empty() {
            return Ok(turns);
        }

        let greeting = vec![ChatTurn {
            sender: ChatSender::Bot,
            content: GREETING.to_string(),
            timestamp: time::now(),
        }];
        self.store_turns(&uid, &greeting).await?;
        Ok(greeting)
    }

    /// Send a prompt; returns the assistant's reply
    ///
    /// The user's turn is persisted before the reply is requested, so a
    /// failed request still leaves the prompt in the history with an
    /// apology reply after it.
    pub async fn send(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::Validation("message cannot be empty".to_string()));
        }
        let uid = self.session.require_uid().await?;

        let mut turns = self.history().await?;
        turns.push(ChatTurn {
            sender: ChatSender::User,
            content: prompt.to_string(),
            timestamp: time::now(),
        });
        self.store_turns(&uid, &turns).await?;

        let reply = match self.analysis.reflect(prompt, &uid).await {
            Ok(raw) => {
                let cleaned = clean_reply(&raw);
                if cleaned.is_empty() {
                    EMPTY_REPLY_FALLBACK.to_string()
                } else {
                    cleaned
                }
            }
            Err(e) => {
                warn!("assistant reply failed: {}", e);
                FAILURE_REPLY.to_string()
            }
        };

        turns.push(ChatTurn {
            sender: ChatSender::Bot,
            content: reply.clone(),
            timestamp: time::now(),
        });
        self.store_turns(&uid, &turns).await?;
        debug!(turns = turns.len(), "chat exchange stored");
        Ok(reply)
    }

    async fn load_turns(&self, uid: &str) -> Result<Vec<ChatTurn>> {
        let docs = self
            .data
            .get_once(&DocPath::users().doc(uid), Query::default())
            .await?;
        let Some(doc) = docs.first() else {
            return Ok(Vec::new());
        };
        match doc.fields.get("messages") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::Internal(format!("malformed chat history: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    async fn store_turns(&self, uid: &str, turns: &[ChatTurn]) -> Result<()> {
        self.data
            .update(
                &DocPath::users().doc(uid),
                json!({
                    "messages": turns,
                    "lastUpdated": time::now(),
                }),
            )
            .await
    }
}
