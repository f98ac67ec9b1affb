use futures::StreamExt;
use std::sync::Arc;

use crate::adapter::{EventStream, Provider};
use crate::types::*;
use sableye_core::{Error, LanguageModel, Result};

/// Drain a provider stream into one response.
///
/// Tokens are concatenated, tool calls from every `ToolCall` event are kept
/// in order. The first `Error` event fails the whole response.
pub async fn collect_response(mut stream: EventStream<'_>) -> Result<ChatResponse> {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Token(token) => content.push_str(&token),
            StreamEvent::ToolCall(calls) => tool_calls.extend(calls),
            StreamEvent::Done => break,
            StreamEvent::Error(message) => return Err(Error::provider(message)),
        }
    }

    let message = if tool_calls.is_empty() {
        ChatMessage::assistant(content)
    } else {
        ChatMessage::with_tool_calls(content, tool_calls.clone())
    };
    Ok(ChatResponse { message, tool_calls })
}

/// Plain prompt-in, text-out model over a chat provider.
///
/// This is the `llm` collaborator handed to skills.
pub struct ChatModel {
    provider: Arc<dyn Provider>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatModel {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider, temperature: None, max_tokens: None }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        let mut builder = ChatRequest::builder().add_message(ChatMessage::user(prompt));
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        builder.build()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ChatModel {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = self.provider.model_name(), prompt_chars = prompt.len(), "invoking model");
        let stream = self.provider.stream_chat(self.request(prompt)).await?;
        let response = collect_response(stream).await?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockEvent, MockProvider, MockResponse};

    fn text(content: &str) -> MockResponse {
        MockResponse::Text { content: content.to_string() }
    }

    #[tokio::test]
    async fn test_invoke_returns_text() {
        let provider = Arc::new(MockProvider::from_responses(vec![text("You ran three times.")]));
        let model = ChatModel::new(provider.clone()).with_temperature(0.2).with_max_tokens(64);

        let reply = model.invoke("Summarise my running").await.unwrap();
        assert_eq!(reply, "You ran three times.");

        let request = &provider.requests()[0];
        assert_eq!(request.messages[0].content, "Summarise my running");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(64));
        assert!(request.tools().is_none());
    }

    #[tokio::test]
    async fn test_invoke_surfaces_stream_error() {
        let provider = Arc::new(MockProvider::from_responses(vec![MockResponse::Error {
            message: "API error: 401".to_string(),
        }]));
        let err = ChatModel::new(provider).invoke("hi").await.unwrap_err();
        assert!(err.to_string().contains("API error: 401"));
    }

    #[tokio::test]
    async fn test_collect_response_joins_tokens_and_calls() {
        let provider = MockProvider::from_responses(vec![MockResponse::Sequence {
            events: vec![
                MockEvent::Token { text: "Let me ".to_string() },
                MockEvent::Token { text: "look.".to_string() },
                MockEvent::ToolCall { name: "search_notes".to_string(), args: serde_json::json!({"input": "x"}) },
                MockEvent::Done,
            ],
        }]);

        let stream = provider.stream_chat(ChatRequest::default()).await.unwrap();
        let response = collect_response(stream).await.unwrap();
        assert_eq!(response.content(), "Let me look.");
        assert!(response.has_tool_calls());
        assert_eq!(response.message.tool_calls.as_ref().map(Vec::len), Some(1));
    }
}
