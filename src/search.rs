//! Web search through the Serper API.
//!
//! A search never fails from the caller's point of view.  Transport errors, error statuses and
//! unreadable bodies are folded into [`SearchResult::Failed`], whose text is interpolated into
//! the prompt like any other search payload.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client as ReqwestClient;
use serde_json::{Value, json};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{SEARCH_DURATION, SEARCH_FAILURES, SEARCH_REQUESTS};
use crate::secrets::Secrets;

/// The public Serper search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://google.serper.dev/search";

/// Prefix of every degraded search result.
pub const SEARCH_ERROR_PREFIX: &str = "An error occurred during web search: ";

/// The outcome of a web search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// The provider's JSON response, untouched.
    Found(Value),

    /// A human-readable description of why the search failed.
    Failed(String),
}

impl SearchResult {
    /// Build a failed result from any displayable cause.
    pub fn failed(cause: impl fmt::Display) -> Self {
        SearchResult::Failed(format!("{SEARCH_ERROR_PREFIX}{cause}"))
    }

    /// Returns true if the search did not produce provider data.
    pub fn is_failed(&self) -> bool {
        matches!(self, SearchResult::Failed(_))
    }

    /// Serialize the result as JSON text for embedding in a prompt.
    ///
    /// Provider data is rendered as compact JSON; a failure is rendered as a JSON string.
    pub fn to_prompt_text(&self) -> String {
        match self {
            SearchResult::Found(value) => value.to_string(),
            SearchResult::Failed(message) => Value::String(message.clone()).to_string(),
        }
    }
}

/// Something that can answer a web search query.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Run `query` and return the result.  Must not fail.
    async fn search(&self, query: &str) -> SearchResult;
}

/// Client for the Serper search API.
#[derive(Clone)]
pub struct SerperSearch {
    headers: HeaderMap,
    client: ReqwestClient,
    endpoint: Url,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl SerperSearch {
    /// Create a client for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, DEFAULT_SEARCH_URL)
    }

    /// Create a client from loaded credentials.
    pub fn from_secrets(secrets: &Secrets) -> Result<Self> {
        Self::new(secrets.serper_api_key.clone())
    }

    /// Create a client that posts to `endpoint` instead of the public one.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: &str) -> Result<Self> {
        let mut key = HeaderValue::from_str(&api_key.into()).map_err(|_| {
            Error::configuration("SERPER_API_KEY contains characters not allowed in a header")
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-API-KEY", key);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            headers,
            client,
            endpoint: Url::parse(endpoint)?,
            logger: None,
        })
    }

    /// Attach a logger that sees every query and its result.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The endpoint queries are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, query: &str) -> std::result::Result<Value, reqwest::Error> {
        self.client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(&json!({ "q": query }))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait::async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str) -> SearchResult {
        SEARCH_REQUESTS.click();
        let start = Instant::now();
        let result = match self.post(query).await {
            Ok(value) => SearchResult::Found(value),
            Err(err) => {
                SEARCH_FAILURES.click();
                SearchResult::failed(err)
            }
        };
        SEARCH_DURATION.add(start.elapsed().as_secs_f64());
        if let Some(logger) = &self.logger {
            logger.log_search(query, &result);
        }
        result
    }
}

impl fmt::Debug for SerperSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerperSearch")
            .field("endpoint", &self.endpoint.as_str())
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}
