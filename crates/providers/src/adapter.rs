use eventsource_stream::Eventsource;
use futures::{StreamExt, stream::Stream};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::embeddings::{HashingEmbedder, OllamaEmbedder, OpenAiEmbedder};
use crate::mock::MockProvider;
use crate::model::ChatModel;
use crate::retry::{RetryConfig, retry_async};
use crate::types::*;
use sableye_core::{Embedder, Error, LanguageModel, ModelConfig, ModelKind, Result};

pub type EventStream<'a> = Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>;

/// Generic provider trait for LLM backends
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Stream chat completion with tools support
    async fn stream_chat<'a>(&'a self, request: ChatRequest) -> Result<EventStream<'a>>;

    /// Model name, for diagnostics
    fn model_name(&self) -> &str;
}

/// Shared HTTP plumbing: client, auth header, retries.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    client: HttpClient,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl HttpBackend {
    pub(crate) fn new(api_key: Option<String>, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::provider(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, api_key, retry })
    }

    /// POST a JSON body, retrying transient failures.
    pub(crate) async fn post_json<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        retry_async(&self.retry, url, || async {
            let mut request = self.client.post(url).json(body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::provider(format!("request to {} failed: {}", url, describe_reqwest_error(&e))))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            let hint = if status.is_server_error() { " (temporary server error)" } else { "" };
            Err(Error::provider(format!("API error: {}{} - {}", status, hint, body)))
        })
        .await
    }
}

fn describe_reqwest_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timeout: {}", e)
    } else if e.is_connect() {
        format!("connection error: {}", e)
    } else {
        e.to_string()
    }
}

/// OpenAI-compatible chat completions provider (streams over SSE)
pub struct OpenAiProvider {
    http: HttpBackend,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpBackend::new(Some(api_key), timeout, RetryConfig::default())?,
            model,
            base_url: base_url.unwrap_or_else(|| ModelKind::OpenAi.default_base_url().to_string()),
        })
    }

    /// Convert ChatRequest to the OpenAI wire format
    fn to_openai_request(&self, request: &ChatRequest) -> OpenAiChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
                tool_call_id: msg.tool_call_id.clone(),
                tool_calls: msg.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|call| OpenAiToolCall {
                            id: call.id.clone(),
                            call_type: "function".to_string(),
                            function: OpenAiFunction {
                                name: call.name().to_string(),
                                arguments: call.arguments().to_string(),
                            },
                        })
                        .collect()
                }),
            })
            .collect();

        OpenAiChatRequest {
            model: self.model.clone(),
            messages,
            tools: request.tools().map(<[ToolSpec]>::to_vec),
            stream: true,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn stream_chat<'a>(&'a self, request: ChatRequest) -> Result<EventStream<'a>> {
        let body = self.to_openai_request(&request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let stream = async_stream::stream! {
            let response = match self.http.post_json(&url, &body).await {
                Ok(resp) => resp,
                Err(e) => {
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            let eventsource = response.bytes_stream().eventsource();
            tokio::pin!(eventsource);
            let mut pending = ToolCallAccumulator::default();

            while let Some(event_result) = eventsource.next().await {
                match event_result {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() {
                            continue;
                        }
                        if data == "[DONE]" {
                            break;
                        }
                        match serde_json::from_str::<OpenAiChunk>(data) {
                            Ok(chunk) => {
                                for choice in chunk.choices {
                                    if let Some(content) = choice.delta.content
                                        && !content.is_empty()
                                    {
                                        yield StreamEvent::Token(content);
                                    }
                                    if let Some(calls) = choice.delta.tool_calls {
                                        pending.extend(calls);
                                    }
                                }
                            }
                            Err(e) => {
                                yield StreamEvent::Error(format!("Failed to parse chunk: {}", e));
                            }
                        }
                    }
                    Err(e) => {
                        yield StreamEvent::Error(format!("SSE error: {}", e));
                        break;
                    }
                }
            }

            let calls = pending.finish();
            if !calls.is_empty() {
                yield StreamEvent::ToolCall(calls);
            }
            yield StreamEvent::Done;
        };

        Ok(Box::pin(stream))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Reassembles tool calls whose name and arguments arrive in fragments.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialToolCall>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    fn extend(&mut self, deltas: Vec<OpenAiToolCallDelta>) {
        for delta in deltas {
            let entry = self.calls.entry(delta.index.unwrap_or(0)).or_default();
            if let Some(id) = delta.id {
                entry.id = id;
            }
            if let Some(function) = delta.function {
                if let Some(name) = function.name {
                    entry.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
        }
    }

    fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter(|(_, call)| !call.name.is_empty())
            .map(|(index, call)| {
                let arguments = if call.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&call.arguments).unwrap_or(serde_json::Value::String(call.arguments))
                };
                let id = if call.id.is_empty() { format!("call_{}", index) } else { call.id };
                ToolCall::new(id, call.name, arguments)
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSpec>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Serialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: OpenAiFunction,
}

/// OpenAI encodes arguments as a JSON string
#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    delta: OpenAiDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<OpenAiFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Ollama `/api/chat` provider
///
/// Requests are made with `stream: false`; the single reply is replayed as
/// stream events.
pub struct OllamaProvider {
    http: HttpBackend,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(model: String, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpBackend::new(None, timeout, RetryConfig::default())?,
            model,
            base_url: base_url.unwrap_or_else(|| ModelKind::Ollama.default_base_url().to_string()),
        })
    }

    fn to_ollama_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
                tool_calls: msg.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|call| OllamaToolCall {
                            function: OllamaFunction {
                                name: call.name().to_string(),
                                arguments: call.arguments().clone(),
                            },
                        })
                        .collect()
                }),
            })
            .collect();

        OllamaChatRequest {
            model: self.model.clone(),
            messages,
            tools: request.tools().map(<[ToolSpec]>::to_vec),
            stream: false,
            options: OllamaOptions { temperature: request.temperature, num_predict: request.max_tokens },
        }
    }
}

#[async_trait::async_trait]
impl Provider for OllamaProvider {
    async fn stream_chat<'a>(&'a self, request: ChatRequest) -> Result<EventStream<'a>> {
        let body = self.to_ollama_request(&request);
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let stream = async_stream::stream! {
            let reply = match self.http.post_json(&url, &body).await {
                Ok(resp) => resp.json::<OllamaChatResponse>().await,
                Err(e) => {
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            match reply {
                Ok(reply) => {
                    if !reply.message.content.is_empty() {
                        yield StreamEvent::Token(reply.message.content);
                    }
                    let calls: Vec<ToolCall> = reply
                        .message
                        .tool_calls
                        .unwrap_or_default()
                        .into_iter()
                        .enumerate()
                        .map(|(i, call)| ToolCall::new(format!("call_{}", i), call.function.name, call.function.arguments))
                        .collect();
                    if !calls.is_empty() {
                        yield StreamEvent::ToolCall(calls);
                    }
                    yield StreamEvent::Done;
                }
                Err(e) => {
                    yield StreamEvent::Error(format!("Failed to parse Ollama response: {}", e));
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSpec>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama encodes arguments as a JSON object
#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

/// Factory to create providers from config
pub struct ProviderFactory;

impl ProviderFactory {
    /// Chat provider used by the agent loop
    pub fn create_from_config(config: &ModelConfig) -> Result<Arc<dyn Provider>> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        match config.kind {
            ModelKind::OpenAi => {
                let api_key = config
                    .api_key
                    .clone()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| Error::Config("OpenAI API key required for openai model type".to_string()))?;
                Ok(Arc::new(OpenAiProvider::new(
                    api_key,
                    config.name.clone(),
                    config.base_url.clone(),
                    timeout,
                )?))
            }
            ModelKind::Ollama => Ok(Arc::new(OllamaProvider::new(
                config.name.clone(),
                config.base_url.clone(),
                timeout,
            )?)),
            ModelKind::Mock => Ok(Arc::new(MockProvider::new(config.responses_file.as_deref()))),
        }
    }

    /// `invoke(prompt) -> text` handle over a chat provider
    pub fn language_model(config: &ModelConfig, provider: Arc<dyn Provider>) -> Arc<dyn LanguageModel> {
        Arc::new(ChatModel::new(provider).with_temperature(config.temperature).with_max_tokens(config.max_tokens))
    }

    /// Embedder matching the configured backend
    pub fn create_embedder(config: &ModelConfig) -> Result<Arc<dyn Embedder>> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        match config.kind {
            ModelKind::OpenAi => Ok(Arc::new(OpenAiEmbedder::new(
                config.api_key.clone().unwrap_or_default(),
                config.embedding_model().to_string(),
                config.base_url().to_string(),
                timeout,
            )?)),
            ModelKind::Ollama => Ok(Arc::new(OllamaEmbedder::new(
                config.embedding_model().to_string(),
                config.base_url().to_string(),
                timeout,
            )?)),
            ModelKind::Mock => Ok(Arc::new(HashingEmbedder::default())),
        }
    }
}
