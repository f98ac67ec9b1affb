//! Chat and embedding backends for Sableye.

pub mod adapter;
pub mod embeddings;
pub mod mock;
pub mod model;
pub mod prompts;
pub mod retry;
pub mod types;

pub use adapter::{EventStream, OllamaProvider, OpenAiProvider, Provider, ProviderFactory};
pub use embeddings::{HashingEmbedder, OllamaEmbedder, OpenAiEmbedder};
pub use mock::{MockEvent, MockProvider, MockResponse};
pub use model::{ChatModel, collect_response};
pub use prompts::{base_system_prompt, system_prompt, system_prompt_with_tools, tool_usage_guidance};
pub use retry::{RetryConfig, is_retryable_error, retry_async};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, FunctionCall, Role, StreamEvent, TOOL_INPUT_FIELD, ToolCall,
    ToolParameter, ToolSpec,
};

pub use sableye_core::{Error, Result};
