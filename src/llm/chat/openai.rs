use async_trait::async_trait;
use log::{ debug, info };
use reqwest::{ Client as HttpClient, RequestBuilder, header::AUTHORIZATION };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ GenerationOptions, LlmConfig, LlmError, LlmType };

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Client for the OpenAI chat completions API and the servers that mimic it
/// (llama.cpp, LM Studio, vLLM). The API key is optional for local servers.
pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
    options: GenerationOptions,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIModelList {
    #[serde(default)]
    data: Vec<OpenAIModel>,
}

#[derive(Deserialize)]
struct OpenAIModel {
    id: String,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        options: GenerationOptions
    ) -> Self {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            http: HttpClient::new(),
            api_key,
            model: chat_model,
            base_url: api_url.trim_end_matches('/').to_string(),
            options,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::OpenAI {
            return Err(LlmError::Config("Invalid config type for OpenAIChatClient".into()));
        }

        Ok(
            Self::new(
                config.api_key.clone(),
                config.completion_model.clone(),
                config.base_url.clone(),
                config.options
            )
        )
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(AUTHORIZATION, format!("Bearer {}", key)),
            None => req,
        }
    }

    fn chat_request(&self, prompt: &str) -> OpenAIChatRequest {
        OpenAIChatRequest {
            model: self.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!("OpenAIChatClient::complete() → model={} url={}", self.model, url);

        let resp = self
            .authorized(self.http.post(&url))
            .json(&self.chat_request(prompt))
            .send().await?
            .error_for_status()?
            .json::<OpenAIResponse>().await?;

        let content = resp.choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse(self.model.clone()))?
            .message.content;

        Ok(CompletionResponse { response: content })
    }

    async fn ensure_ready(&self) -> Result<(), LlmError> {
        let url = format!("{}/v1/models", self.base_url);
        let list = self
            .authorized(self.http.get(&url))
            .send().await?
            .error_for_status()?
            .json::<OpenAIModelList>().await?;

        if list.data.iter().any(|m| m.id == self.model) {
            info!("Model '{}' is available at {}", self.model, self.base_url);
            Ok(())
        } else {
            Err(LlmError::ModelNotFound {
                model: self.model.clone(),
                base_url: self.base_url.clone(),
            })
        }
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
