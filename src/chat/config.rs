//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::conversation::{PREAMBLE_ACK, SYSTEM_PREAMBLE};
use crate::secrets::DEFAULT_SECRETS_PATH;
use crate::types::{GenerationConfig, Model};

/// Command-line arguments for the searchchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Path to the YAML secrets file.
    #[arrrg(optional, "Secrets file (default: .searchchat/secrets.yaml)", "PATH")]
    pub secrets: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Sampling parameters sent on every turn.
    pub generation_config: GenerationConfig,

    /// Hidden instruction that seeds the conversation.
    pub preamble: String,

    /// Hidden acknowledgment of the preamble.
    pub preamble_ack: String,

    /// Where credentials are loaded from.
    pub secrets_path: PathBuf,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-1.5-flash
    /// - Temperature 0.7, 2048 output tokens
    /// - The built-in assistant persona
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            generation_config: GenerationConfig::default(),
            preamble: SYSTEM_PREAMBLE.to_string(),
            preamble_ack: PREAMBLE_ACK.to_string(),
            secrets_path: PathBuf::from(DEFAULT_SECRETS_PATH),
            use_color: true,
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

    /// Sets the hidden seed pair.
    pub fn with_preamble(mut self, preamble: impl Into<String>, ack: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self.preamble_ack = ack.into();
        self
    }

    /// Sets the secrets file location.
    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            model: args.model.map(Model::from).unwrap_or(defaults.model),
            secrets_path: args
                .secrets
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_path),
            use_color: !args.no_color,
            ..ChatConfig::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini15Flash));
        assert_eq!(config.generation_config.temperature, Some(0.7));
        assert_eq!(config.generation_config.max_output_tokens, Some(2048));
        assert_eq!(config.preamble, SYSTEM_PREAMBLE);
        assert_eq!(config.secrets_path, PathBuf::from(DEFAULT_SECRETS_PATH));
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config.model, Model::Known(KnownModel::Gemini15Flash));
        assert_eq!(config.secrets_path, PathBuf::from(DEFAULT_SECRETS_PATH));
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemini-2.5-pro".to_string()),
            secrets: Some("/etc/searchchat.yaml".to_string()),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Pro));
        assert_eq!(config.secrets_path, PathBuf::from("/etc/searchchat.yaml"));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model(Model::Custom("tunedModels/x".to_string()))
            .with_generation_config(GenerationConfig::new().with_temperature(0.1))
            .with_preamble("be brief", "ok")
            .with_secrets_path("secrets.yaml")
            .without_color();

        assert_eq!(config.model.to_string(), "tunedModels/x");
        assert_eq!(config.generation_config.temperature, Some(0.1));
        assert_eq!(config.generation_config.max_output_tokens, None);
        assert_eq!(config.preamble, "be brief");
        assert_eq!(config.preamble_ack, "ok");
        assert_eq!(config.secrets_path, PathBuf::from("secrets.yaml"));
        assert!(!config.use_color);
    }
}
