use serde::{Deserialize, Serialize};

/// Sampling temperature used for every chat turn.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Output token ceiling used for every chat turn.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Sampling parameters sent alongside the conversation.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens the model may produce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Create an empty `GenerationConfig` that defers to provider defaults.
    pub fn new() -> Self {
        Self {
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token ceiling.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

impl Default for GenerationConfig {
    /// The fixed chat parameters: temperature 0.7, 2048 output tokens.
    fn default() -> Self {
        Self::new()
            .with_temperature(DEFAULT_TEMPERATURE)
            .with_max_output_tokens(DEFAULT_MAX_OUTPUT_TOKENS)
    }
}
