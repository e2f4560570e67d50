use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    MODEL_RATE_LIMITED, MODEL_REQUEST_DURATION, MODEL_REQUEST_ERRORS, MODEL_REQUESTS,
};
use crate::secrets::Secrets;
use crate::sse::process_sse;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// A stream of decoded response chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Client for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct Gemini {
    headers: HeaderMap,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl Gemini {
    /// Create a new Gemini client with library-default transport settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a client from loaded credentials.
    pub fn from_secrets(secrets: &Secrets) -> Result<Self> {
        Self::new(secrets.google_api_key.clone())
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` must end in `/`; it defaults to the public `v1beta` endpoint.  No request
    /// timeout is applied unless one is given.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let mut key = HeaderValue::from_str(&api_key).map_err(|_| {
            Error::configuration("GOOGLE_API_KEY contains characters not allowed in a header")
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert("x-goog-api-key", key);

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        let base_url = Url::parse(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        Ok(Self {
            headers,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request and streamed chunk.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for `method` on `model`, e.g. `models/gemini-1.5-flash:generateContent`.
    fn endpoint(&self, model: &Model, method: &str) -> Result<Url> {
        let model = model.to_string();
        let path = if model.contains('/') {
            format!("{model}:{method}")
        } else {
            format!("models/{model}:{method}")
        };
        Ok(self.base_url.join(&path)?)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    async fn post(&self, url: Url, request: &GenerateContentRequest) -> Result<Response> {
        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }
        MODEL_REQUESTS.click();
        let start = Instant::now();
        let result = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await;
        MODEL_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                MODEL_REQUEST_ERRORS.click();
                return Err(self.map_send_error(e));
            }
        };
        if !response.status().is_success() {
            let err = process_error_response(response).await;
            MODEL_REQUEST_ERRORS.click();
            if err.is_rate_limit() {
                MODEL_RATE_LIMITED.click();
            }
            return Err(err);
        }
        Ok(response)
    }

    /// Send a conversation to the API and get a non-streaming response.
    pub async fn send(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent")?;
        let response = self.post(url, request).await?;
        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
            })
    }

    /// Send a conversation to the API and get a streaming response.
    ///
    /// Errors that occur before the first byte (bad credentials, exhausted quota) are returned
    /// directly.  Errors after that arrive as `Err` items on the stream.
    pub async fn stream(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        let mut url = self.endpoint(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let response = self.post(url, request).await?;
        let chunks = process_sse(response.bytes_stream());
        match self.logger.clone() {
            Some(logger) => Ok(Box::pin(chunks.inspect(move |chunk| {
                if let Ok(chunk) = chunk {
                    logger.log_stream_chunk(chunk);
                }
            }))),
            None => Ok(Box::pin(chunks)),
        }
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

/// The `error` object of a provider error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub(crate) code: Option<u16>,
    pub(crate) message: Option<String>,
    pub(crate) status: Option<String>,
}

/// Map an HTTP status and provider status string to an [`Error`].
pub(crate) fn error_for_status(
    status_code: u16,
    status: Option<String>,
    message: String,
    retry_after: Option<u64>,
) -> Error {
    if status.as_deref() == Some("RESOURCE_EXHAUSTED") {
        return Error::rate_limit(message, retry_after);
    }
    match status_code {
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}

/// Process API response errors and convert to our Error type
async fn process_error_response(response: Response) -> Error {
    let status_code = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<u64>().ok());

    let error_body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {e}"),
                Some(Box::new(e)),
            );
        }
    };

    let detail = serde_json::from_str::<ApiErrorBody>(&error_body)
        .ok()
        .and_then(|body| body.error);
    let (message, status) = match detail {
        Some(detail) => (detail.message.unwrap_or_else(|| error_body.clone()), detail.status),
        None => (error_body, None),
    };
    error_for_status(status_code, status, message, retry_after)
}
