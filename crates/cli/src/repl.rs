//! Interactive chat input handling.

pub const DEFAULT_RECENT_DAYS: u32 = 7;

pub const HELP: &str = "\
Commands:
  /help           Show this help
  /recent [days]  Show entries from the last N days (default 7)
  /stats          Show vault statistics
  /skills         List loaded skills
  /memory         Show conversation history
  /clear          Clear the screen
  /reset          Forget the conversation so far
  /exit           Leave (also /quit, /q)

Anything else is sent to the assistant.";

/// A slash command typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Recent(u32),
    InvalidRecent,
    Stats,
    Skills,
    Memory,
    Clear,
    Reset,
    Exit,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "/help" => ReplCommand::Help,
            "/recent" => match parts.next() {
                None => ReplCommand::Recent(DEFAULT_RECENT_DAYS),
                Some(days) => days.parse().map_or(ReplCommand::InvalidRecent, ReplCommand::Recent),
            },
            "/stats" => ReplCommand::Stats,
            "/skills" => ReplCommand::Skills,
            "/memory" => ReplCommand::Memory,
            "/clear" => ReplCommand::Clear,
            "/reset" => ReplCommand::Reset,
            "/exit" | "/quit" | "/q" => ReplCommand::Exit,
            _ => ReplCommand::Unknown(name),
        }
    }
}

/// One line read from the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Command(ReplCommand),
    Message(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Input::Empty
        } else if line.starts_with('/') {
            Input::Command(ReplCommand::parse(line))
        } else {
            Input::Message(line.to_string())
        }
    }
}

/// Message sent to the assistant for `/recent`.
pub fn recent_query(days: u32) -> String {
    format!("Show me my journal entries from the last {} days", days)
}
