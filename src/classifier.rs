//! Decides whether a user message should be answered with fresh web results.

/// Prefixes that mark a factual lookup.
const LOOKUP_PREFIXES: [&str; 3] = ["what is", "what are", "who is"];

/// Phrases that mark a question about the assistant itself rather than the world.
const SELF_REFERENCES: [&str; 2] = ["your name", "your purpose"];

/// Phrases that call for current information wherever they appear.
const SEARCH_KEYWORDS: [&str; 7] = [
    "latest news",
    "current price",
    "who is",
    "what is the status of",
    "recent events",
    "today's weather",
    "what happened in",
];

/// Returns true if `text` should be augmented with web search results.
///
/// Matching is case-insensitive.  A message starting with "what is", "what are" or "who is"
/// needs a search unless it asks about the assistant's name or purpose.  Otherwise a message
/// needs a search if it contains one of the time-sensitive keywords anywhere.
///
/// ```
/// use searchchat::needs_search;
///
/// assert!(needs_search("What is the capital of France?"));
/// assert!(!needs_search("What is your name?"));
/// assert!(needs_search("tell me the latest news on AI"));
/// assert!(!needs_search("write a function to reverse a list"));
/// ```
pub fn needs_search(text: &str) -> bool {
    let text = text.to_lowercase();
    if LOOKUP_PREFIXES
        .iter()
        .any(|prefix| text.starts_with(prefix))
        && !SELF_REFERENCES.iter().any(|phrase| text.contains(phrase))
    {
        return true;
    }
    SEARCH_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}
