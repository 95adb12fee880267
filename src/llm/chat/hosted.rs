use async_trait::async_trait;
use log::{ debug, warn };

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError, LlmType };
use rllm::chat::{ ChatMessage, ChatRole, MessageType };
use rllm::builder::{ LLMBackend, LLMBuilder };
use rllm::LLMProvider;

fn backend_for(llm_type: LlmType) -> Result<(LLMBackend, &'static str), LlmError> {
    match llm_type {
        LlmType::Anthropic => Ok((LLMBackend::Anthropic, "claude-3-5-haiku-latest")),
        LlmType::Gemini => Ok((LLMBackend::Google, "gemini-1.5-flash-latest")),
        LlmType::DeepSeek => Ok((LLMBackend::DeepSeek, "deepseek-chat")),
        LlmType::XAI => Ok((LLMBackend::XAI, "grok-2-latest")),
        LlmType::Groq => Ok((LLMBackend::Groq, "llama-3.1-8b-instant")),
        other =>
            Err(LlmError::Config(format!("{:?} is not served through the hosted client", other))),
    }
}

/// Remote providers driven through `rllm`. Token and temperature limits are
/// fixed when the provider is built.
pub struct HostedChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    llm_type: LlmType,
    model: String,
    base_url: Option<String>,
}

impl HostedChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let (backend, default_model) = backend_for(config.llm_type)?;
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| {
                LlmError::Config(format!("API key is required for {:?}", config.llm_type))
            })?;
        let model = config.completion_model.clone().unwrap_or_else(|| default_model.to_string());

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .api_key(api_key)
            .model(&model)
            .max_tokens(config.options.max_tokens)
            .temperature(config.options.temperature)
            .stream(false);

        if let Some(url) = &config.base_url {
            builder = builder.base_url(url);
        }

        let llm_provider = builder.build().map_err(|e| LlmError::Provider(e.to_string()))?;

        Ok(Self {
            llm: llm_provider,
            llm_type: config.llm_type,
            model,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ChatClient for HostedChatClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: prompt.to_string(),
            message_type: MessageType::Text,
        }];
        debug!("HostedChatClient::complete() → backend={:?} model={}", self.llm_type, self.model);
        let resp = self.llm.chat(&messages).await.map_err(|e| LlmError::Provider(e.to_string()))?;
        let text = resp
            .text()
            .map(|s| s.to_string())
            .unwrap_or_else(|| resp.to_string());
        Ok(CompletionResponse { response: text })
    }

    /// Remote providers bill per call, so startup only validates the
    /// configuration done in `from_config`; a bad model or key shows up as
    /// generation errors.
    async fn ensure_ready(&self) -> Result<(), LlmError> {
        warn!(
            "{:?} model '{}' is not checked at startup; configuration errors surface on first reply",
            self.llm_type,
            self.model
        );
        Ok(())
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backends_are_not_hosted() {
        assert!(backend_for(LlmType::Ollama).is_err());
        assert!(backend_for(LlmType::OpenAI).is_err());
        assert!(backend_for(LlmType::Gemini).is_ok());
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = LlmConfig { llm_type: LlmType::Groq, ..LlmConfig::default() };
        assert!(matches!(HostedChatClient::from_config(&config), Err(LlmError::Config(_))));
    }

    #[tokio::test]
    async fn configured_client_is_ready_without_network() {
        let config = LlmConfig {
            llm_type: LlmType::Groq,
            api_key: Some("gsk-test".into()),
            base_url: Some("http://127.0.0.1:1".into()),
            ..LlmConfig::default()
        };
        let client = HostedChatClient::from_config(&config).unwrap();
        assert_eq!(client.get_model(), "llama-3.1-8b-instant");
        assert!(client.ensure_ready().await.is_ok());
    }
}
