use crate::adapter::{EventStream, Provider};
use crate::types::*;
use sableye_core::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted reply for the offline `mock` model type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MockResponse {
    Text { content: String },
    ToolCall { name: String, args: serde_json::Value },
    Error { message: String },
    Sequence { events: Vec<MockEvent> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MockEvent {
    Token { text: String },
    ToolCall { name: String, args: serde_json::Value },
    Done,
}

/// `[[responses]]` table loaded from `responses_file`
#[derive(Debug, Deserialize)]
struct MockScript {
    responses: Vec<MockResponse>,
}

/// Replays scripted responses in order; no network access.
pub struct MockProvider {
    responses: Vec<MockResponse>,
    current: Arc<AtomicUsize>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(responses_file: Option<&Path>) -> Self {
        let responses = match responses_file {
            Some(path) => Self::load_responses(path),
            None => vec![MockResponse::Text {
                content: "Mock response - set model.responses_file to script replies".to_string(),
            }],
        };
        Self::from_responses(responses)
    }

    pub fn from_responses(responses: Vec<MockResponse>) -> Self {
        Self { responses, current: Arc::new(AtomicUsize::new(0)), requests: Mutex::new(Vec::new()) }
    }

    /// Parse a `[[responses]]` script.
    pub fn parse_script(content: &str) -> Result<Vec<MockResponse>> {
        Ok(toml::from_str::<MockScript>(content)?.responses)
    }

    fn load_responses(path: &Path) -> Vec<MockResponse> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "mock responses file not found");
            return vec![MockResponse::Text { content: format!("Mock responses file not found: {}", path.display()) }];
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::parse_script(&content) {
                Ok(responses) => responses,
                Err(e) => {
                    tracing::error!("Failed to parse mock responses: {}", e);
                    vec![MockResponse::Error { message: format!("Failed to parse mock responses: {}", e) }]
                }
            },
            Err(e) => {
                tracing::error!("Failed to read mock responses file: {}", e);
                vec![MockResponse::Error { message: format!("Failed to read mock responses file: {}", e) }]
            }
        }
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn get_next_response(&self) -> MockResponse {
        let index = self.current.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(index) {
            Some(response) => response.clone(),
            None => MockResponse::Text {
                content: format!(
                    "No more mock responses configured (requested: {}, available: {})",
                    index + 1,
                    self.responses.len()
                ),
            },
        }
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    async fn stream_chat<'a>(&'a self, request: ChatRequest) -> Result<EventStream<'a>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let response = self.get_next_response();

        let stream = async_stream::stream! {
            match response {
                MockResponse::Text { content } => {
                    yield StreamEvent::Token(content);
                }
                MockResponse::ToolCall { name, args } => {
                    yield StreamEvent::ToolCall(vec![ToolCall::new("mock_0", name, args)]);
                }
                MockResponse::Error { message } => {
                    yield StreamEvent::Error(message);
                    return;
                }
                MockResponse::Sequence { events } => {
                    for (i, event) in events.into_iter().enumerate() {
                        match event {
                            MockEvent::Token { text } => {
                                yield StreamEvent::Token(text);
                            }
                            MockEvent::ToolCall { name, args } => {
                                yield StreamEvent::ToolCall(vec![ToolCall::new(format!("mock_{}", i), name, args)]);
                            }
                            MockEvent::Done => {
                                yield StreamEvent::Done;
                                return;
                            }
                        }
                    }
                }
            }
            yield StreamEvent::Done;
        };

        Ok(Box::pin(stream))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
