//! Sableye agent: session bootstrap, the tool-calling loop and chat memory.

mod agent;
mod memory;
mod session;

pub use agent::{Agent, AgentEvent};
pub use memory::ChatMemory;
pub use session::{STATS_RECENT_DAYS, Session, VaultStats};
