pub mod chat;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Model '{model}' is not available at {base_url}")]
    ModelNotFound {
        model: String,
        base_url: String,
    },
    #[error("Invalid LLM configuration: {0}")]
    Config(String),
    #[error("Empty response from model '{0}'")]
    EmptyResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmType {
    Ollama,
    OpenAI,
    Anthropic,
    Gemini,
    DeepSeek,
    XAI,
    Groq,
}

impl FromStr for LlmType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmType::Ollama),
            "openai" => Ok(LlmType::OpenAI),
            "anthropic" => Ok(LlmType::Anthropic),
            "gemini" => Ok(LlmType::Gemini),
            "deepseek" => Ok(LlmType::DeepSeek),
            "xai" => Ok(LlmType::XAI),
            "groq" => Ok(LlmType::Groq),
            _ => Err(LlmError::Config(format!("Unsupported LLM type: '{}'", s))),
        }
    }
}

/// Sampling limits applied to every generated reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub options: GenerationOptions,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Ollama,
            api_key: None,
            completion_model: None,
            base_url: None,
            options: GenerationOptions::default(),
        }
    }
}

impl LlmConfig {
    pub fn from_args(args: &crate::cli::Args) -> Result<Self, LlmError> {
        Ok(Self {
            llm_type: args.chat_llm_type.parse()?,
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.trim().is_empty()),
            completion_model: args.chat_model.clone().filter(|m| !m.trim().is_empty()),
            base_url: args.chat_base_url.clone().filter(|u| !u.trim().is_empty()),
            options: GenerationOptions {
                max_tokens: args.max_tokens,
                temperature: args.temperature,
            },
        })
    }
}
