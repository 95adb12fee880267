use crate::cli::Args;
use crate::dataset::{ Dataset, DatasetMatcher, MatchError };
use crate::llm::LlmConfig;
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };

use log::{ info, error };
use std::error::Error;
use std::sync::Arc;

pub const GENERATION_APOLOGY: &str = "Sorry, I couldn't generate a response at the moment.";

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Predefined(String),
    Generated(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Predefined(text) | Reply::Generated(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Predefined(text) | Reply::Generated(text) => text,
        }
    }
}

#[derive(Clone)]
pub struct ChatAgent {
    matcher: DatasetMatcher,
    chat_client: Arc<dyn ChatClient>,
}

impl ChatAgent {
    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let dataset = Arc::new(Dataset::load_or_empty(&args.dataset_path));

        let chat_config = LlmConfig::from_args(args)?;
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            args.chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        if let Err(e) = chat_client.ensure_ready().await {
            error!("Error loading model '{}': {}", chat_client.get_model(), e);
            return Err(format!("Failed to load model '{}': {}", chat_client.get_model(), e).into());
        }

        Ok(Self::from_parts(dataset, chat_client))
    }

    pub fn from_parts(dataset: Arc<Dataset>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            matcher: DatasetMatcher::new(dataset),
            chat_client,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        self.matcher.dataset()
    }

    pub fn predefined_response(&self, message: &str) -> Result<Option<String>, MatchError> {
        self.matcher.find_response(message)
    }

    /// Never fails; backend errors are logged and replaced by an apology.
    pub async fn generate_response(&self, message: &str) -> String {
        match self.chat_client.complete(message).await {
            Ok(resp) => resp.response,
            Err(e) => {
                error!("Generation error ({}): {}", self.chat_client.get_model(), e);
                GENERATION_APOLOGY.to_string()
            }
        }
    }

    /// `message` must already be trimmed and non-empty.
    pub async fn process_message(&self, message: &str) -> Result<Reply, MatchError> {
        match self.predefined_response(message)? {
            Some(predefined) if !predefined.is_empty() => {
                info!("Served predefined response.");
                return Ok(Reply::Predefined(predefined));
            }
            _ => {}
        }

        info!("Sending user-defined query to model: {}", message);
        let reply = self.generate_response(message).await;
        info!("Model response: {}", reply);

        Ok(Reply::Generated(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::llm::chat::CompletionResponse;
    use crate::models::dataset::ConversationRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingClient {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Some(reply.to_string()), prompts: Mutex::new(Vec::new()) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: None, prompts: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(reply) => Ok(CompletionResponse { response: reply.clone() }),
                None => Err(LlmError::Provider("model crashed".into())),
            }
        }

        fn get_model(&self) -> String {
            "recording".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent(records: Vec<ConversationRecord>, client: Arc<RecordingClient>) -> ChatAgent {
        ChatAgent::from_parts(Arc::new(Dataset::new(records)), client)
    }

    #[tokio::test]
    async fn predefined_reply_skips_generation() {
        let client = RecordingClient::answering("generated");
        let agent = agent(
            vec![ConversationRecord::new("What is a fever?", "A fever is...")],
            client.clone()
        );

        let reply = agent.process_message("what is a fever").await.unwrap();
        assert_eq!(reply, Reply::Predefined("A fever is...".into()));
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unmatched_query_is_generated_with_original_casing() {
        let client = RecordingClient::answering("generated");
        let agent = agent(vec![], client.clone());

        let reply = agent.process_message("XYZ123 Unmatched nonsense").await.unwrap();
        assert_eq!(reply, Reply::Generated("generated".into()));
        assert_eq!(*client.prompts.lock().unwrap(), vec!["XYZ123 Unmatched nonsense".to_string()]);
    }

    #[tokio::test]
    async fn generation_failure_becomes_apology() {
        let agent = agent(vec![], RecordingClient::failing());
        assert_eq!(agent.generate_response("xyz").await, GENERATION_APOLOGY);
        let reply = agent.process_message("xyz").await.unwrap();
        assert_eq!(reply.text(), GENERATION_APOLOGY);
    }

    #[tokio::test]
    async fn empty_canned_reply_falls_through_to_generation() {
        let client = RecordingClient::answering("generated");
        let agent = agent(vec![ConversationRecord::new("insomnia", "")], client.clone());

        let reply = agent.process_message("insomnia").await.unwrap();
        assert_eq!(reply, Reply::Generated("generated".into()));
    }

    #[tokio::test]
    async fn startup_fails_without_a_reachable_model() {
        use clap::Parser;

        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "health-chat",
            "--chat-llm-type",
            "ollama",
            "--chat-base-url",
            "http://127.0.0.1:1",
            "--dataset-path",
            dir.path().join("missing.json").to_str().unwrap(),
        ]).unwrap();

        assert!(ChatAgent::new(&args).await.is_err());
    }
}
