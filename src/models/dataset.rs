use serde::{ Serialize, Deserialize };

pub const USER_ROLE: &str = "user";

/// Keys are optional so one incomplete entry does not reject the whole file;
/// the matcher reports it only when a scan reaches it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatasetMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DatasetMessage {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self { role: Some(role.into()), text: Some(text.into()) }
    }
}

/// One stored exchange. The first message is expected to be the user's
/// question and the second the bot's answer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<DatasetMessage>>,
}

impl ConversationRecord {
    pub fn new(user_text: impl Into<String>, bot_text: impl Into<String>) -> Self {
        Self::from_messages(
            vec![DatasetMessage::new(USER_ROLE, user_text), DatasetMessage::new("assistant", bot_text)]
        )
    }

    pub fn from_messages(messages: Vec<DatasetMessage>) -> Self {
        Self { messages: Some(messages) }
    }
}
