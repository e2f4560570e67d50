//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! history and drives one streamed turn at a time.

use std::time::Instant;

use futures::StreamExt;

use crate::accumulating_stream::AccumulatingStream;
use crate::chat::config::ChatConfig;
use crate::classifier::needs_search;
use crate::client::Gemini;
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::generator::{ChatModel, ResponseGenerator};
use crate::observability::{
    CHAT_FAILED_TURNS, CHAT_SEARCH_TURNS, CHAT_TURN_DURATION, CHAT_TURNS,
};
use crate::render::Renderer;
use crate::search::{SerperSearch, WebSearch};
use crate::secrets::Secrets;
use crate::types::{GenerationConfig, Model};

/// Shown before a web search is issued.
pub const SEARCHING_INFO: &str = "Performing a real-time web search...";

/// Shown with every answer that was built from search results.
pub const SEARCH_NOTICE: &str = "I've used real-time web search to answer your question.";

/// Shown when the model provider reports quota exhaustion.
pub const RATE_LIMIT_MESSAGE: &str =
    "I'm receiving too many requests right now. Please wait a moment and try again.";

/// Prefix of the message shown for any other failed turn.
pub const UNEXPECTED_ERROR_PREFIX: &str = "An unexpected error occurred. Please try again. Details: ";

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Whether the answer was built from web search results.
    pub searched: bool,
    /// The full answer text, as stored in the conversation.
    pub text: String,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of stored messages, hidden seed pair included.
    pub message_count: usize,
    /// Completed user/model exchanges.
    pub turns: usize,
    /// Turns answered from web search results.
    pub searched_turns: u64,
    /// Turns abandoned because of an error.
    pub failed_turns: u64,
    /// Sampling parameters sent on every turn.
    pub generation_config: GenerationConfig,
}

/// The user-facing text for a failed turn.
pub fn error_message(err: &Error) -> String {
    if err.is_rate_limit() {
        RATE_LIMIT_MESSAGE.to_string()
    } else {
        format!("{UNEXPECTED_ERROR_PREFIX}{err}")
    }
}

/// A chat session that manages conversation state and model interactions.
///
/// The session maintains message history and handles streaming responses,
/// folding in web search results when a message calls for them.
pub struct ChatSession<M: ChatModel, S: WebSearch> {
    generator: ResponseGenerator<M, S>,
    conversation: Conversation,
    config: ChatConfig,
    searched_turns: u64,
    failed_turns: u64,
}

impl ChatSession<Gemini, SerperSearch> {
    /// Creates a session talking to the public Gemini and Serper endpoints.
    pub fn from_secrets(secrets: &Secrets, config: ChatConfig) -> Result<Self> {
        let model = Gemini::from_secrets(secrets)?;
        let search = SerperSearch::from_secrets(secrets)?;
        Ok(Self::new(model, search, config))
    }
}

impl<M: ChatModel, S: WebSearch> ChatSession<M, S> {
    /// Creates a new chat session seeded with the configured preamble.
    pub fn new(chat_model: M, search: S, config: ChatConfig) -> Self {
        let generator = ResponseGenerator::new(chat_model, search)
            .with_model(config.model.clone())
            .with_generation_config(config.generation_config);
        let conversation =
            Conversation::with_preamble(config.preamble.clone(), config.preamble_ack.clone());
        Self {
            generator,
            conversation,
            config,
            searched_turns: 0,
            failed_turns: 0,
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Searches the web if the message calls for it
    /// 3. Renders answer fragments as they arrive
    /// 4. Adds the complete answer to history
    ///
    /// # Errors
    ///
    /// Returns the first error raised opening or consuming the model stream.  The user message
    /// stays in history; no model message is added.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        self.conversation.push_user(user_input);
        renderer.print_user_input(user_input);

        if needs_search(user_input) {
            renderer.print_info(SEARCHING_INFO);
        }
        let response = self
            .generator
            .respond(self.conversation.messages(), user_input)
            .await?;
        if response.searched {
            renderer.print_notice(SEARCH_NOTICE);
        }

        renderer.start_response();
        let (mut stream, text_rx) = AccumulatingStream::new(response.stream);
        while let Some(fragment) = stream.next().await {
            // The first error ends the stream and is delivered through the channel.
            if let Ok(text) = fragment {
                renderer.print_text(&text);
            }
        }
        renderer.finish_response();

        let text = text_rx
            .await
            .map_err(|_| Error::streaming("answer stream closed before completion", None))??;
        self.conversation.push_model(text.clone());

        if response.searched {
            self.searched_turns += 1;
            CHAT_SEARCH_TURNS.click();
        }
        Ok(TurnOutcome {
            searched: response.searched,
            text,
        })
    }

    /// Runs one turn and renders any failure as a user-facing message.
    ///
    /// The returned error has already been shown; callers only need it to decide what to do
    /// next.
    pub async fn submit(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        let start = Instant::now();
        CHAT_TURNS.click();
        let outcome = self.send_streaming(user_input, renderer).await;
        CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &outcome {
            self.failed_turns += 1;
            CHAT_FAILED_TURNS.click();
            renderer.print_error(&error_message(err));
        }
        outcome
    }

    /// Re-renders every visible message with its role's identity.
    pub fn render_transcript(&self, renderer: &mut dyn Renderer) {
        for message in self.conversation.visible() {
            renderer.print_message(message.role, &message.text());
        }
    }

    /// Clears the conversation history, keeping the hidden seed pair.
    pub fn clear(&mut self) {
        self.conversation.reset();
    }

    /// Returns the conversation history.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the number of messages in the conversation, seed pair included.
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model.clone();
        self.generator.set_model(model);
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        self.generator.model()
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.model().clone(),
            message_count: self.message_count(),
            turns: self.conversation.turns(),
            searched_turns: self.searched_turns,
            failed_turns: self.failed_turns,
            generation_config: *self.generator.generation_config(),
        }
    }
}
