//! Logging trait for model and search traffic.
//!
//! This module provides the [`ClientLogger`] trait that allows callers to capture
//! every request sent through [`Gemini`](crate::Gemini) and every query sent through
//! [`SerperSearch`](crate::SerperSearch).

use crate::search::SearchResult;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// A trait for logging client operations.
///
/// Implement this trait to record all API interactions, including the outgoing request,
/// each streamed chunk, and each web search together with its (possibly degraded) result.
///
/// # Example
///
/// ```rust,ignore
/// use searchchat::{ClientLogger, GenerateContentRequest, GenerateContentResponse, SearchResult};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &GenerateContentRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
///
///     fn log_search(&self, query: &str, result: &SearchResult) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "search {query:?}: {}", result.to_prompt_text()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent to the model.
    fn log_request(&self, request: &GenerateContentRequest);

    /// Log an individual streamed chunk as it is decoded.
    fn log_stream_chunk(&self, chunk: &GenerateContentResponse);

    /// Log a web search and its result.
    ///
    /// Failed searches are logged too; their result is the degraded error text.
    fn log_search(&self, query: &str, result: &SearchResult);
}
