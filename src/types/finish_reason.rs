use serde::{Deserialize, Serialize};

/// Reasons why the model stopped generating a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Natural stop point or a configured stop sequence.
    Stop,

    /// The output token ceiling was reached.
    MaxTokens,

    /// The candidate was flagged for safety reasons.
    Safety,

    /// The candidate was flagged for reciting training data.
    Recitation,

    /// Some other provider-side reason.
    Other,

    /// Any value this crate does not know about yet.
    #[serde(other)]
    Unspecified,
}

impl FinishReason {
    /// Returns true if the candidate was cut off by a content filter.
    pub fn is_filtered(&self) -> bool {
        matches!(self, FinishReason::Safety | FinishReason::Recitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_roundtrip() {
        let reason: FinishReason = serde_json::from_str(r#""MAX_TOKENS""#).unwrap();
        assert_eq!(reason, FinishReason::MaxTokens);
        assert_eq!(serde_json::to_string(&reason).unwrap(), r#""MAX_TOKENS""#);
    }

    #[test]
    fn unknown_reason_is_unspecified() {
        let reason: FinishReason = serde_json::from_str(r#""BLOCKLIST""#).unwrap();
        assert_eq!(reason, FinishReason::Unspecified);
    }

    #[test]
    fn filtered_reasons() {
        assert!(FinishReason::Safety.is_filtered());
        assert!(FinishReason::Recitation.is_filtered());
        assert!(!FinishReason::Stop.is_filtered());
    }
}
