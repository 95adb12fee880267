use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use super::{ ChatClient, CompletionResponse };
use crate::llm::{ GenerationOptions, LlmConfig, LlmError, LlmType };
use log::{ debug, info };

pub const DEFAULT_MODEL: &str = "mistral:7b-instruct-v0.2-q4_0";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
    options: GenerationOptions,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Ollama treats a model name without a tag as `<name>:latest`.
fn tag_matches(listed: &str, wanted: &str) -> bool {
    listed == wanted || (!wanted.contains(':') && listed == format!("{}:latest", wanted))
}

impl OllamaClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: Option<String>,
        options: GenerationOptions
    ) -> Self {
        let model = completion_model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into());

        Self {
            http: HttpClient::new(),
            base_url: url.trim_end_matches('/').to_string(),
            completion_model: model,
            options,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::Ollama {
            return Err(LlmError::Config("Invalid config type for OllamaClient".into()));
        }

        Ok(Self::new(config.base_url.clone(), config.completion_model.clone(), config.options))
    }

    fn generate_request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.options.max_tokens,
                temperature: self.options.temperature,
            },
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let req = self.generate_request(prompt);
        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<GenerateResponse>().await?;
        Ok(data)
    }

    fn check_listed(&self, models: &[String]) -> Result<(), LlmError> {
        if models.iter().any(|name| tag_matches(name, &self.completion_model)) {
            Ok(())
        } else {
            Err(LlmError::ModelNotFound {
                model: self.completion_model.clone(),
                base_url: self.base_url.clone(),
            })
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let tags = self.http
            .get(&url)
            .send().await?
            .error_for_status()?
            .json::<TagsResponse>().await?;
        Ok(
            tags.models
                .into_iter()
                .map(|m| m.name)
                .collect()
        )
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        debug!("OllamaClient::complete() → model={}", self.completion_model);
        let gen_resp = self.generate(prompt).await?;
        Ok(CompletionResponse { response: gen_resp.response })
    }

    async fn ensure_ready(&self) -> Result<(), LlmError> {
        let models = self.list_models().await?;
        self.check_listed(&models)?;
        info!("Ollama model '{}' is available at {}", self.completion_model, self.base_url);
        Ok(())
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_carries_sampling_options() {
        let client = OllamaClient::new(None, None, GenerationOptions::default());
        let body = serde_json::to_value(client.generate_request("What is a fever?")).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["prompt"], "What is a fever?");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 150);
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new(
            Some("http://gpu-box:11434/".into()),
            Some("llama3".into()),
            GenerationOptions::default()
        );
        assert_eq!(client.get_base_url().as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(client.get_model(), "llama3");
    }

    #[test]
    fn untagged_model_matches_latest() {
        assert!(tag_matches("llama3:latest", "llama3"));
        assert!(tag_matches("llama3:8b", "llama3:8b"));
        assert!(!tag_matches("llama3:8b", "llama3"));
        assert!(!tag_matches("mistral:latest", "llama3"));
    }

    #[test]
    fn tags_response_tolerates_extra_fields() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"mistral:7b-instruct-v0.2-q4_0","size":4109865159}]}"#
        ).unwrap();
        assert_eq!(tags.models[0].name, DEFAULT_MODEL);
    }

    #[test]
    fn model_missing_from_tags_is_not_ready() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llama3:latest"},{"name":"phi3:mini"}]}"#
        ).unwrap();
        let listed: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();

        let client = OllamaClient::new(None, None, GenerationOptions::default());
        match client.check_listed(&listed) {
            Err(LlmError::ModelNotFound { model, base_url }) => {
                assert_eq!(model, DEFAULT_MODEL);
                assert_eq!(base_url, DEFAULT_BASE_URL);
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }

        let llama = OllamaClient::new(None, Some("llama3".into()), GenerationOptions::default());
        assert!(llama.check_listed(&listed).is_ok());
    }

    #[tokio::test]
    async fn unreachable_server_is_not_ready() {
        let client = OllamaClient::new(
            Some("http://127.0.0.1:1".into()),
            None,
            GenerationOptions::default()
        );
        assert!(matches!(client.ensure_ready().await, Err(LlmError::Http(_))));
    }
}
