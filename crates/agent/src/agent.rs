use std::sync::Arc;

use sableye_core::{AgentConfig, Error, ModelConfig, Result};
use sableye_providers::{
    ChatMessage, ChatRequest, Provider, ToolParameter, ToolSpec, collect_response,
    system_prompt_with_tools,
};
use sableye_skills::{Tool, ToolOutput};
use tokio::sync::mpsc;

use crate::memory::ChatMemory;

const INPUT_DESCRIPTION: &str = "The tool input as a single string";

/// Events sent from the agent while it answers
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The model asked for a tool
    ToolCall { name: String, input: String },
    /// A tool finished; `is_error` mirrors the `Error:` marker
    ToolResult { name: String, output: String, is_error: bool },
    /// The turn failed
    Error(String),
}

/// Orchestrator that answers user messages with the registered tools
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: Vec<Tool>,
    memory: ChatMemory,
    max_iterations: usize,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, tools: Vec<Tool>) -> Self {
        let defaults = AgentConfig::default();
        Self {
            provider,
            tools,
            memory: ChatMemory::new(defaults.history_limit),
            max_iterations: defaults.max_iterations,
            temperature: None,
            max_tokens: None,
            events: None,
        }
    }

    /// Apply `[agent]` limits and `[model]` sampling settings.
    pub fn configured(self, agent: &AgentConfig, model: &ModelConfig) -> Self {
        self.with_max_iterations(agent.max_iterations)
            .with_history_limit(agent.history_limit)
            .with_temperature(model.temperature)
            .with_max_tokens(model.max_tokens)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.memory = ChatMemory::new(limit);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Report tool activity on `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Start reporting tool activity, replacing any previous receiver.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AgentEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn memory(&self) -> &ChatMemory {
        &self.memory
    }

    /// Function definitions sent with each request
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec::new(tool.name(), tool.description(), ToolParameter::single_input(INPUT_DESCRIPTION)))
            .collect()
    }

    /// Answer a user message. Never fails: errors become the answer text.
    #[tracing::instrument(skip_all)]
    pub async fn chat(&mut self, message: &str) -> String {
        self.memory.push(ChatMessage::user(message));

        match self.run_turn().await {
            Ok(answer) => {
                self.memory.push(ChatMessage::assistant(answer.clone()));
                answer
            }
            Err(e) => {
                tracing::error!(error = %e, "chat turn failed");
                self.emit(AgentEvent::Error(e.to_string()));
                format!("I encountered an error: {}", e)
            }
        }
    }

    pub fn clear_memory(&mut self) {
        self.memory.clear();
        tracing::info!("conversation memory cleared");
    }

    pub fn memory_summary(&self) -> String {
        self.memory.summary()
    }

    async fn run_turn(&self) -> Result<String> {
        let system = system_prompt_with_tools(self.tools.iter().map(|tool| (tool.name(), tool.description())));
        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(self.memory.window().iter().cloned());

        let specs = self.tool_specs();

        for iteration in 0..self.max_iterations {
            let mut builder = ChatRequest::builder().messages(messages.clone()).tools(specs.clone());
            if let Some(temperature) = self.temperature {
                builder = builder.temperature(temperature);
            }
            if let Some(max_tokens) = self.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }

            let stream = self.provider.stream_chat(builder.build()).await?;
            let response = collect_response(stream).await?;

            if !response.has_tool_calls() {
                tracing::debug!(iteration, "model answered");
                return Ok(response.message.content);
            }

            messages.push(response.message.clone());
            for call in &response.tool_calls {
                let input = call.input();
                self.emit(AgentEvent::ToolCall { name: call.name().to_string(), input: input.clone() });

                let output = match self.tool(call.name()) {
                    Some(tool) => tool.invoke(&input).await,
                    None => {
                        tracing::warn!(tool = call.name(), "model requested an unknown tool");
                        ToolOutput::error(format!("unknown tool '{}'", call.name()))
                    }
                };

                self.emit(AgentEvent::ToolResult {
                    name: call.name().to_string(),
                    output: output.content.clone(),
                    is_error: output.is_error,
                });
                messages.push(ChatMessage::tool(call.id.clone(), output.content));
            }
        }

        Err(Error::Other(format!("no final answer after {} model calls", self.max_iterations)))
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sableye_providers::{MockProvider, MockResponse, Role};
    use serde_json::json;

    fn notes_tool() -> Tool {
        Tool::from_fn("search_notes", "Search notes", |input: String| async move {
            Ok(format!("--- Entry 1: a.md (Modified: 2024-01-01) ---\nabout {}\n", input))
        })
    }

    fn text(content: &str) -> MockResponse {
        MockResponse::Text { content: content.to_string() }
    }

    fn call(name: &str, input: &str) -> MockResponse {
        MockResponse::ToolCall { name: name.to_string(), args: json!({ "input": input }) }
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let provider = Arc::new(MockProvider::from_responses(vec![text("Hello!")]));
        let mut agent = Agent::new(provider.clone(), vec![notes_tool()]);

        assert_eq!(agent.chat("hi").await, "Hello!");
        assert_eq!(agent.memory().len(), 2);

        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("`search_notes`"));
        assert_eq!(request.messages.last().unwrap().content, "hi");
        assert_eq!(request.tools().unwrap()[0].name(), "search_notes");
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = Arc::new(MockProvider::from_responses(vec![call("search_notes", "sleep"), text("You slept well.")]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agent = Agent::new(provider.clone(), vec![notes_tool()]).with_events(tx);

        assert_eq!(agent.chat("How did I sleep?").await, "You slept well.");

        let requests = provider.requests();
        let second = &requests[1];
        let tool_message = second.messages.last().unwrap();
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("mock_0"));
        assert!(tool_message.content.contains("about sleep"));

        assert_eq!(rx.recv().await, Some(AgentEvent::ToolCall { name: "search_notes".into(), input: "sleep".into() }));
        assert!(matches!(rx.recv().await, Some(AgentEvent::ToolResult { is_error: false, .. })));
    }

    #[tokio::test]
    async fn test_subscribe_after_construction() {
        let provider = Arc::new(MockProvider::from_responses(vec![MockResponse::Error { message: "down".into() }]));
        let mut agent = Agent::new(provider, Vec::new());
        let mut rx = agent.subscribe();

        agent.chat("hello").await;
        assert_eq!(rx.try_recv().ok(), Some(AgentEvent::Error("provider error: down".into())));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let provider = Arc::new(MockProvider::from_responses(vec![call("read_minds", "x"), text("Sorry.")]));
        let mut agent = Agent::new(provider.clone(), vec![notes_tool()]);

        assert_eq!(agent.chat("?").await, "Sorry.");
        let tool_message = provider.requests()[1].messages.last().cloned().unwrap();
        assert_eq!(tool_message.content, "Error: unknown tool 'read_minds'");
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let provider = Arc::new(MockProvider::from_responses(vec![
            call("search_notes", "a"),
            call("search_notes", "b"),
            text("never reached"),
        ]));
        let mut agent = Agent::new(provider, vec![notes_tool()]).with_max_iterations(2);

        let answer = agent.chat("loop").await;
        assert!(answer.starts_with("I encountered an error:"));
        assert!(answer.contains("no final answer after 2 model calls"));
        assert_eq!(agent.memory().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_becomes_answer() {
        let provider = Arc::new(MockProvider::from_responses(vec![MockResponse::Error {
            message: "rate limited".to_string(),
        }]));
        let mut agent = Agent::new(provider, Vec::new());

        let answer = agent.chat("hello").await;
        assert_eq!(answer, "I encountered an error: provider error: rate limited");
    }

    #[tokio::test]
    async fn test_history_window_and_reset() {
        let provider = Arc::new(MockProvider::from_responses(vec![text("one"), text("two"), text("three")]));
        let mut agent = Agent::new(provider.clone(), Vec::new()).with_history_limit(2);

        agent.chat("first").await;
        agent.chat("second").await;
        assert_eq!(provider.requests().len(), 2);

        agent.clear_memory();
        assert_eq!(agent.memory_summary(), "No conversation history");
        agent.chat("third").await;

        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[2].messages.len(), 2);
    }

    #[test]
    fn test_configured_applies_limits() {
        let agent_config = AgentConfig { max_iterations: 0, history_limit: 4, ..AgentConfig::default() };
        let agent = Agent::new(Arc::new(MockProvider::new(None)), vec![notes_tool()])
            .configured(&agent_config, &ModelConfig::default());

        assert_eq!(agent.max_iterations, 1);
        assert_eq!(agent.temperature, Some(0.7));
        assert_eq!(agent.tool_specs().len(), 1);
        assert!(agent.tool("search_notes").is_some());
    }
}
