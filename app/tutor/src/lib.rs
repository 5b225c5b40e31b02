//! Haka tutor: a multi-persona tutoring assistant that keeps working when
//! the network degrades or drops, by routing every turn between a hosted
//! model and a local Ollama model.

pub use cmd::{Cli, Command};
pub use config::TutorConfig;
pub use mcp::McpServer;
pub use orchestrator::{Orchestrator, SessionEvent, TurnOutcome, Verdict};
pub use persona::{Persona, Personas, Phase};

pub mod cmd;
pub mod config;
pub mod mcp;
pub mod orchestrator;
pub mod persona;
pub mod repl;
pub mod utils;
