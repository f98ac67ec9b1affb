//! Rolling conversation history.

use sableye_providers::{ChatMessage, Role};

const PREVIEW_CHARS: usize = 100;

/// User and assistant turns, oldest first.
///
/// Everything is kept; only the newest `limit` messages are sent to the
/// model or shown in the summary.
#[derive(Debug, Clone)]
pub struct ChatMemory {
    messages: Vec<ChatMessage>,
    limit: usize,
}

impl ChatMemory {
    pub fn new(limit: usize) -> Self {
        Self { messages: Vec::new(), limit }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// The newest `limit` messages.
    pub fn window(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(self.limit);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Human-readable listing of the recent turns.
    pub fn summary(&self) -> String {
        if self.messages.is_empty() {
            return "No conversation history".to_string();
        }

        let mut summary = format!("Conversation history ({} messages):\n", self.messages.len());
        for message in self.window() {
            let role = if message.role == Role::User { "User" } else { "Agent" };
            summary.push_str(&format!("- {}: {}\n", role, preview(&message.content)));
        }
        summary
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        format!("{}...", content.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let memory = ChatMemory::new(10);
        assert!(memory.is_empty());
        assert_eq!(memory.summary(), "No conversation history");
    }

    #[test]
    fn test_window_keeps_newest() {
        let mut memory = ChatMemory::new(2);
        memory.push(ChatMessage::user("one"));
        memory.push(ChatMessage::assistant("two"));
        memory.push(ChatMessage::user("three"));

        assert_eq!(memory.len(), 3);
        let window: Vec<&str> = memory.window().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(window, vec!["two", "three"]);
    }

    #[test]
    fn test_summary_previews() {
        let mut memory = ChatMemory::new(10);
        memory.push(ChatMessage::user("How was my week?"));
        memory.push(ChatMessage::assistant("a".repeat(150)));

        let summary = memory.summary();
        assert!(summary.starts_with("Conversation history (2 messages):\n"));
        assert!(summary.contains("- User: How was my week?\n"));
        assert!(summary.contains(&format!("- Agent: {}...\n", "a".repeat(100))));

        memory.clear();
        assert_eq!(memory.summary(), "No conversation history");
    }
}
