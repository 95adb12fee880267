use super::Dataset;
use crate::models::dataset::{ DatasetMessage, USER_ROLE };
use std::sync::Arc;
use thiserror::Error;

/// Substrings that mark a message as a greeting. Checked before the dataset.
pub const GREETING_TOKENS: [&str; 6] = [
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good evening",
];

pub const GREETING_REPLY: &str =
    "Hello! How can I assist you with your health and fitness today? 😊";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Conversation record {index} matched but has no reply message")]
    MissingReply {
        index: usize,
    },
    #[error("Conversation record {index} is missing '{key}'")]
    MalformedRecord {
        index: usize,
        key: &'static str,
    },
}

pub fn normalize(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

pub fn is_greeting(normalized_query: &str) -> bool {
    GREETING_TOKENS.iter().any(|greet| normalized_query.contains(greet))
}

/// First-match-wins lookup of canned replies.
///
/// A record matches when its normalized user text contains the normalized
/// query or the other way round. This is deliberately loose: a short record
/// such as "fever" matches any query mentioning fever. Results depend on the
/// order records were loaded in.
#[derive(Debug, Clone)]
pub struct DatasetMatcher {
    dataset: Arc<Dataset>,
}

impl DatasetMatcher {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn find_response(&self, query: &str) -> Result<Option<String>, MatchError> {
        let user_query = normalize(query);

        if is_greeting(&user_query) {
            return Ok(Some(GREETING_REPLY.to_string()));
        }

        for (index, conv) in self.dataset.records().iter().enumerate() {
            let messages = conv.messages
                .as_deref()
                .ok_or(MatchError::MalformedRecord { index, key: "messages" })?;
            for msg in messages {
                let role = msg.role
                    .as_deref()
                    .ok_or(MatchError::MalformedRecord { index, key: "role" })?;
                if role != USER_ROLE {
                    continue;
                }
                let text = msg.text
                    .as_deref()
                    .ok_or(MatchError::MalformedRecord { index, key: "text" })?;
                let question = normalize(text);
                if user_query.contains(&question) || question.contains(&user_query) {
                    return reply_of(index, messages).map(Some);
                }
            }
        }

        Ok(None)
    }
}

/// The canned answer is always the record's second message.
fn reply_of(index: usize, messages: &[DatasetMessage]) -> Result<String, MatchError> {
    let reply = messages.get(1).ok_or(MatchError::MissingReply { index })?;
    reply.text.clone().ok_or(MatchError::MalformedRecord { index, key: "text" })
}
