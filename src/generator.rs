//! Turns a user message into a streaming model answer.
//!
//! The generator classifies the message, runs a web search when needed, builds the prompt the
//! model actually sees, and opens a streaming model call.  It hands back whether a search was
//! used before any answer text has been pulled, so the caller can announce it first.

use std::pin::Pin;

use futures::future;
use futures::stream::{Stream, StreamExt};

use crate::classifier::needs_search;
use crate::client::{ChunkStream, Gemini};
use crate::error::{Error, Result};
use crate::search::{SearchResult, WebSearch};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Model,
};

/// A lazy, finite stream of answer text fragments.
///
/// A failure ends the stream: after an `Err` item no further items are produced.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A model that can stream an answer to a conversation.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Open a streaming call for `request` against `model`.
    async fn stream_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream>;
}

#[async_trait::async_trait]
impl ChatModel for Gemini {
    async fn stream_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        self.stream(model, request).await
    }
}

/// The result of [`ResponseGenerator::respond`].
pub struct Response {
    /// Whether web search results were folded into the prompt.
    pub searched: bool,
    /// The text sent to the model as the final user message.
    pub prompt: String,
    /// The answer, fragment by fragment.
    pub stream: TextStream,
}

/// Build the prompt that asks the model to answer `user_text` from `result`.
pub fn augment_prompt(user_text: &str, result: &SearchResult) -> String {
    format!(
        "Based on these web search results: {}, provide a comprehensive answer to the user's original query: {user_text}",
        result.to_prompt_text()
    )
}

/// Composes history, optional search results and the new message into a streaming model call.
pub struct ResponseGenerator<M: ChatModel, S: WebSearch> {
    chat_model: M,
    search: S,
    model: Model,
    generation_config: GenerationConfig,
}

impl<M: ChatModel, S: WebSearch> ResponseGenerator<M, S> {
    /// Create a generator with the default model and the fixed chat parameters.
    pub fn new(chat_model: M, search: S) -> Self {
        Self {
            chat_model,
            search,
            model: Model::default(),
            generation_config: GenerationConfig::default(),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling parameters.
    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Changes the model used for later turns.
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// Returns the sampling parameters.
    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    /// Build the prompt for `user_text`, searching first if the classifier asks for it.
    ///
    /// Returns whether a search ran and the prompt to send.
    pub async fn prepare_prompt(&self, user_text: &str) -> (bool, String) {
        if needs_search(user_text) {
            let result = self.search.search(user_text).await;
            (true, augment_prompt(user_text, &result))
        } else {
            (false, user_text.to_string())
        }
    }

    /// Answer `user_text` in the context of `history`.
    ///
    /// `history` is not modified; the (possibly augmented) prompt is appended to a copy.  Errors
    /// opening the model call are returned here; errors while streaming arrive on the stream.
    pub async fn respond(&self, history: &[Content], user_text: &str) -> Result<Response> {
        let (searched, prompt) = self.prepare_prompt(user_text).await;

        let mut contents = history.to_vec();
        contents.push(Content::user(prompt.clone()));
        let request =
            GenerateContentRequest::new(contents).with_generation_config(self.generation_config);

        let chunks = self.chat_model.stream_content(&self.model, &request).await?;
        Ok(Response {
            searched,
            prompt,
            stream: text_stream(chunks),
        })
    }
}

/// Reduce a chunk stream to its answer text.
///
/// Chunks without text are skipped.  A blocked prompt or a filtered, empty candidate becomes an
/// error.  The stream ends after the first error.
pub fn text_stream<S>(chunks: S) -> TextStream
where
    S: Stream<Item = Result<GenerateContentResponse>> + Send + 'static,
{
    Box::pin(
        chunks
            .filter_map(|chunk| future::ready(chunk_text(chunk)))
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                *failed = item.is_err();
                future::ready(Some(item))
            }),
    )
}

fn chunk_text(chunk: Result<GenerateContentResponse>) -> Option<Result<String>> {
    let chunk = match chunk {
        Ok(chunk) => chunk,
        Err(err) => return Some(Err(err)),
    };
    if let Some(reason) = chunk.block_reason() {
        return Some(Err(Error::bad_request(format!(
            "the prompt was blocked by the provider ({reason})"
        ))));
    }
    let text = chunk.text();
    if !text.is_empty() {
        return Some(Ok(text));
    }
    match chunk.finish_reason() {
        Some(reason) if reason.is_filtered() => Some(Err(Error::bad_request(format!(
            "the response was stopped by the provider ({reason:?})"
        )))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, FinishReason, PromptFeedback};
    use futures::stream;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingModel {
        requests: Mutex<Vec<GenerateContentRequest>>,
        fragments: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl ChatModel for RecordingModel {
        async fn stream_content(
            &self,
            _: &Model,
            request: &GenerateContentRequest,
        ) -> Result<ChunkStream> {
            self.requests.lock().unwrap().push(request.clone());
            let chunks = self
                .fragments
                .iter()
                .map(|text| Ok(chunk(text)))
                .collect::<Vec<_>>();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    struct FixedSearch(Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl WebSearch for FixedSearch {
        async fn search(&self, query: &str) -> SearchResult {
            self.0.lock().unwrap().push(query.to_string());
            SearchResult::Found(json!({"answerBox": {"answer": "Paris"}}))
        }
    }

    fn chunk(text: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content::model(text)),
                ..Candidate::default()
            }],
            ..GenerateContentResponse::default()
        }
    }

    fn generator(fragments: Vec<&'static str>) -> ResponseGenerator<RecordingModel, FixedSearch> {
        ResponseGenerator::new(
            RecordingModel {
                requests: Mutex::new(Vec::new()),
                fragments,
            },
            FixedSearch(Mutex::new(Vec::new())),
        )
    }

    #[test]
    fn augmented_prompt_embeds_payload_and_question() {
        let prompt = augment_prompt(
            "Who is the mayor?",
            &SearchResult::Found(json!({"k": "v"})),
        );
        assert_eq!(
            prompt,
            r#"Based on these web search results: {"k":"v"}, provide a comprehensive answer to the user's original query: Who is the mayor?"#
        );
    }

    #[tokio::test]
    async fn search_turn_augments_prompt() {
        let generator = generator(vec!["Paris", "."]);
        let history = vec![Content::user("seed"), Content::model("ack")];

        let response = generator
            .respond(&history, "What is the capital of France?")
            .await
            .unwrap();
        assert!(response.searched);
        assert!(response.prompt.contains("What is the capital of France?"));
        assert!(response.prompt.contains(r#"{"answerBox":{"answer":"Paris"}}"#));

        let text = response
            .stream
            .map(|fragment| fragment.unwrap())
            .collect::<String>()
            .await;
        assert_eq!(text, "Paris.");

        assert_eq!(
            *generator.search.0.lock().unwrap(),
            vec!["What is the capital of France?".to_string()]
        );
        let requests = generator.chat_model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].contents.len(), 3);
        assert_eq!(
            requests[0].last_content().map(Content::text),
            Some(response.prompt.clone())
        );
        assert_eq!(
            requests[0].generation_config,
            Some(GenerationConfig::default())
        );
        // The caller's history is untouched.
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn plain_turn_sends_text_unchanged() {
        let generator = generator(vec!["Recursion is..."]);
        let response = generator.respond(&[], "Explain recursion").await.unwrap();
        assert!(!response.searched);
        assert_eq!(response.prompt, "Explain recursion");
        assert!(generator.search.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn text_stream_skips_empty_chunks_and_stops_after_error() {
        let chunks = stream::iter(vec![
            Ok(chunk("a")),
            Ok(GenerateContentResponse::default()),
            Err(Error::streaming("connection reset", None)),
            Ok(chunk("never")),
        ]);
        let items = text_stream(chunks).collect::<Vec<_>>().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert!(items[1].as_ref().unwrap_err().is_streaming());
    }

    #[tokio::test]
    async fn blocked_prompt_is_an_error() {
        let blocked = GenerateContentResponse {
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".to_string()),
            }),
            ..GenerateContentResponse::default()
        };
        let items = text_stream(stream::iter(vec![Ok(blocked)]))
            .collect::<Vec<_>>()
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_bad_request());
    }

    #[tokio::test]
    async fn filtered_empty_candidate_is_an_error() {
        let filtered = GenerateContentResponse {
            candidates: vec![Candidate {
                finish_reason: Some(FinishReason::Safety),
                ..Candidate::default()
            }],
            ..GenerateContentResponse::default()
        };
        let items = text_stream(stream::iter(vec![Ok(chunk("partial")), Ok(filtered)]))
            .collect::<Vec<_>>()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }
}
