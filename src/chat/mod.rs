//! Interactive chat sessions with web-search-augmented answers.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! searchchat client library. It supports:
//!
//! - Streaming answers rendered fragment by fragment
//! - Automatic web search for time-sensitive questions
//! - Slash commands for session control
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state and turn handling
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{
    ChatSession, RATE_LIMIT_MESSAGE, SEARCH_NOTICE, SEARCHING_INFO, SessionStats, TurnOutcome,
    UNEXPECTED_ERROR_PREFIX, error_message,
};
