use serde::{Deserialize, Serialize};

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into(), tool_call_id: Some(tool_call_id.into()), tool_calls: None }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: Some(tool_calls) }
    }
}

/// A function call initiated by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A tool call made by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall { name: name.into(), arguments },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn arguments(&self) -> &serde_json::Value {
        &self.function.arguments
    }

    /// The single string argument a Sableye tool takes.
    ///
    /// Accepts `{"input": "..."}`, a bare JSON string, or any other object
    /// with exactly one string field. Anything else yields an empty input.
    pub fn input(&self) -> String {
        match &self.function.arguments {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => {
                if let Some(value) = map.get(TOOL_INPUT_FIELD) {
                    return value_to_input(value);
                }
                match map.values().next() {
                    Some(value) if map.len() == 1 => value_to_input(value),
                    _ => String::new(),
                }
            }
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Name of the single parameter every tool exposes to the model
pub const TOOL_INPUT_FIELD: &str = "input";

fn value_to_input(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JSON schema for tool parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ToolParameter {
    String { description: Option<String> },
    Object { properties: Vec<(String, ToolParameter)>, required: Vec<String> },
}

impl ToolParameter {
    pub fn new_string(description: impl Into<String>) -> Self {
        Self::String { description: Some(description.into()) }
    }

    pub fn new_object(properties: Vec<(String, ToolParameter)>) -> Self {
        Self::Object { properties, required: Vec::new() }
    }

    pub fn with_required(self, names: &[&str]) -> Self {
        match self {
            Self::Object { properties, .. } => {
                Self::Object { properties, required: names.iter().map(|n| n.to_string()).collect() }
            }
            other => other,
        }
    }

    /// The single-string-argument schema shared by every Sableye tool.
    pub fn single_input(description: impl Into<String>) -> Self {
        Self::new_object(vec![(TOOL_INPUT_FIELD.to_string(), Self::new_string(description))])
            .with_required(&[TOOL_INPUT_FIELD])
    }

    /// Render as a JSON Schema fragment.
    pub fn to_schema(&self) -> serde_json::Value {
        fn typed(kind: &str, description: &Option<String>) -> serde_json::Value {
            let mut schema = serde_json::json!({ "type": kind });
            if let Some(description) = description {
                schema["description"] = serde_json::Value::String(description.clone());
            }
            schema
        }

        match self {
            Self::String { description } => typed("string", description),
            Self::Object { properties, required } => {
                let props: serde_json::Map<String, serde_json::Value> =
                    properties.iter().map(|(name, param)| (name.clone(), param.to_schema())).collect();
                serde_json::json!({ "type": "object", "properties": props, "required": required })
            }
        }
    }
}

/// A tool offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: ToolParameter) -> Self {
        Self {
            spec_type: "function".to_string(),
            function: FunctionSpec {
                name: name.into(),
                description: Some(description.into()),
                parameters: parameters.to_schema(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> Option<&str> {
        self.function.description.as_deref()
    }
}

/// A request to a chat provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }

    /// Tools attached to the request, `None` when empty.
    pub fn tools(&self) -> Option<&[ToolSpec]> {
        self.tools.as_deref().filter(|tools| !tools.is_empty())
    }
}

#[derive(Default)]
pub struct ChatRequestBuilder {
    request: ChatRequest,
}

impl ChatRequestBuilder {
    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.request.messages = messages;
        self
    }

    pub fn add_message(mut self, message: ChatMessage) -> Self {
        self.request.messages.push(message);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.request.tools = Some(tools);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.request.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.request.max_tokens = Some(max);
        self
    }

    pub fn build(self) -> ChatRequest {
        self.request
    }
}

/// A complete response assembled from a stream
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self { message: ChatMessage::assistant(content), tool_calls: Vec::new() }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Events from streaming responses
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A single token or chunk of content
    Token(String),
    /// Tool calls initiated by the model
    ToolCall(Vec<ToolCall>),
    /// End of stream
    Done,
    /// An error occurred during streaming
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::builder()
            .add_message(ChatMessage::user("Hello"))
            .temperature(0.7)
            .max_tokens(100)
            .build();

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(100));
        assert!(request.tools().is_none());
    }

    #[test]
    fn test_empty_tool_list_is_none() {
        let request = ChatRequest::builder().tools(vec![]).build();
        assert!(request.tools().is_none());
    }

    #[test]
    fn test_chat_message_variants() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);

        let tool_msg = ChatMessage::tool("call_1", "output");
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));

        let msg = ChatMessage::with_tool_calls("", vec![ToolCall::new("c", "t", serde_json::json!({}))]);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.tool_calls.unwrap().len(), 1);
    }

    #[test]
    fn test_tool_call_input_from_object() {
        let call = ToolCall::new("id", "track_progress", serde_json::json!({"input": "daily exercise"}));
        assert_eq!(call.name(), "track_progress");
        assert_eq!(call.input(), "daily exercise");
    }

    #[test]
    fn test_tool_call_input_variants() {
        let call = ToolCall::new("id", "t", serde_json::json!("raw string"));
        assert_eq!(call.input(), "raw string");

        let call = ToolCall::new("id", "t", serde_json::json!({"days": 14}));
        assert_eq!(call.input(), "14");

        let call = ToolCall::new("id", "t", serde_json::json!({"a": "x", "b": "y"}));
        assert_eq!(call.input(), "");

        let call = ToolCall::new("id", "t", serde_json::Value::Null);
        assert_eq!(call.input(), "");
    }

    #[test]
    fn test_single_input_schema() {
        let schema = ToolParameter::single_input("What to look for").to_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["input"]["type"], "string");
        assert_eq!(schema["properties"]["input"]["description"], "What to look for");
        assert_eq!(schema["required"], serde_json::json!(["input"]));
    }

    #[test]
    fn test_tool_spec_accessors() {
        let spec = ToolSpec::new("my_tool", "A tool", ToolParameter::single_input("param"));
        assert_eq!(spec.name(), "my_tool");
        assert_eq!(spec.description(), Some("A tool"));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["parameters"]["type"], "object");
    }
}
