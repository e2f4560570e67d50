//! A terminal chat assistant that answers from live web search results when a question calls
//! for them.

// Public modules
pub mod accumulating_stream;
pub mod chat;
pub mod classifier;
pub mod client;
pub mod client_logger;
pub mod conversation;
pub mod error;
pub mod generator;
pub mod render;
pub mod search;
pub mod secrets;
pub mod types;

mod observability;
mod sse;

// Re-exports
pub use accumulating_stream::AccumulatingStream;
pub use classifier::needs_search;
pub use client::{ChunkStream, Gemini};
pub use client_logger::ClientLogger;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use generator::{ChatModel, Response, ResponseGenerator, TextStream};
pub use observability::register_biometrics;
pub use search::{SearchResult, SerperSearch, WebSearch};
pub use secrets::Secrets;
pub use types::*;
