use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::errors::LlmError;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A function the model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<ChatReply, LlmError>;
}

/// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
    strict: bool,
}

impl From<ToolDefinition> for OpenAiTool {
    fn from(tool: ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OpenAiFunction {
                name: tool.name,
                description: tool.description,
                parameters: tool.parameters,
                strict: true,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }

    async fn call_openai(&self, request: &OpenAiRequest) -> Result<OpenAiResponse, LlmError> {
        let response = self.client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        response.json::<OpenAiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<ChatReply, LlmError> {
        info!("Requesting LLM completion (model: {}, tools: {})", self.model, tools.len());

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages,
            tools: tools.into_iter().map(OpenAiTool::from).collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.call_openai(&request).await?;

        if let Some(usage) = &response.usage {
            info!("LLM completion generated. Tokens: {} prompt + {} completion = {} total",
                  usage.prompt_tokens, usage.completion_tokens, usage.total_tokens);
        }

        into_reply(response)
    }
}

fn into_reply(response: OpenAiResponse) -> Result<ChatReply, LlmError> {
    let message = response.choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?
        .message;

    Ok(ChatReply {
        content: message.content,
        tool_calls: message.tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect(),
    })
}

/// LLM service with provider abstraction
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Self {
        let provider = if config.enabled {
            match config.api_key.as_deref().filter(|key| !key.is_empty()) {
                Some(api_key) => {
                    info!("Initializing LLM service with provider: {}", config.provider);
                    match config.provider.as_str() {
                        "openai" => match OpenAiProvider::new(api_key.to_string(), config) {
                            Ok(provider) => Some(Arc::new(provider) as Arc<dyn LlmProvider>),
                            Err(e) => {
                                warn!("Failed to initialize OpenAI provider: {}. LLM features disabled.", e);
                                None
                            }
                        },
                        _ => {
                            warn!("Unknown LLM provider: {}. LLM features disabled.", config.provider);
                            None
                        }
                    }
                }
                None => {
                    warn!("LLM API key not configured. LLM features disabled.");
                    None
                }
            }
        } else {
            info!("LLM features are disabled in configuration");
            None
        };

        Self { provider }
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn LlmProvider>, LlmError> {
        self.provider.as_ref().ok_or(LlmError::Disabled)
    }

    /// Free-text completion for a system + user prompt pair.
    pub async fn generate_completion(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let reply = self.provider()?
            .chat(vec![ChatMessage::system(system), ChatMessage::user(user)], Vec::new())
            .await?;

        reply.content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Empty completion content".to_string()))
    }

    /// Offers `tools` to the model and returns the calls it chose to make.
    pub async fn request_tool_calls(
        &self,
        prompt: &str,
        tools: Vec<ToolDefinition>,
    ) -> Result<Vec<ToolCall>, LlmError> {
        let reply = self.provider()?
            .chat(vec![ChatMessage::user(prompt)], tools)
            .await?;

        Ok(reply.tool_calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedProvider(ChatReply);

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn chat(
            &self,
            _messages: Vec<ChatMessage>,
            _tools: Vec<ToolDefinition>,
        ) -> Result<ChatReply, LlmError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_llm_service_disabled_without_api_key() {
        let service = LlmService::new(&LlmConfig::default());
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_llm_service_disabled_by_flag() {
        let config = LlmConfig {
            enabled: false,
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert!(!LlmService::new(&config).is_enabled());
    }

    #[test]
    fn test_unknown_provider_disables_service() {
        let config = LlmConfig {
            provider: "mystery".to_string(),
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert!(!LlmService::new(&config).is_enabled());
    }

    #[tokio::test]
    async fn test_llm_service_returns_disabled_error() {
        let service = LlmService::new(&LlmConfig::default());
        let result = service.generate_completion("system", "user").await;
        assert!(matches!(result, Err(LlmError::Disabled)));
    }

    #[tokio::test]
    async fn test_empty_completion_is_invalid() {
        let service = LlmService::with_provider(Arc::new(CannedProvider(ChatReply {
            content: Some("   ".to_string()),
            tool_calls: Vec::new(),
        })));
        let result = service.generate_completion("system", "user").await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_request_serializes_tools_only_when_present() {
        let request = OpenAiRequest {
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage::user("hi")],
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["role"], "user");

        let request = OpenAiRequest {
            tools: vec![OpenAiTool::from(ToolDefinition {
                name: "search_news".to_string(),
                description: "Search".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            })],
            ..request
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "search_news");
        assert_eq!(json["tools"][0]["function"]["strict"], true);
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "search_news", "arguments": "{\"query\":\"bitcoin price\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let response: OpenAiResponse = serde_json::from_str(body).unwrap();
        let reply = into_reply(response).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "search_news");
        assert_eq!(reply.tool_calls[0].arguments, "{\"query\":\"bitcoin price\"}");
    }

    #[test]
    fn test_response_without_choices_is_invalid() {
        let response: OpenAiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(into_reply(response), Err(LlmError::InvalidResponse(_))));
    }
}
