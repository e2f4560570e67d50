use biometrics::{Collector, Counter, Moments};

pub(crate) static MODEL_REQUESTS: Counter = Counter::new("searchchat.model.requests");
pub(crate) static MODEL_REQUEST_ERRORS: Counter = Counter::new("searchchat.model.request_errors");
pub(crate) static MODEL_RATE_LIMITED: Counter = Counter::new("searchchat.model.rate_limited");
pub(crate) static MODEL_REQUEST_DURATION: Moments =
    Moments::new("searchchat.model.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("searchchat.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("searchchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("searchchat.stream.bytes");

pub(crate) static SEARCH_REQUESTS: Counter = Counter::new("searchchat.search.requests");
pub(crate) static SEARCH_FAILURES: Counter = Counter::new("searchchat.search.failures");
pub(crate) static SEARCH_DURATION: Moments = Moments::new("searchchat.search.duration_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("searchchat.chat.turns");
pub(crate) static CHAT_SEARCH_TURNS: Counter = Counter::new("searchchat.chat.search_turns");
pub(crate) static CHAT_FAILED_TURNS: Counter = Counter::new("searchchat.chat.failed_turns");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("searchchat.chat.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&MODEL_REQUESTS);
    collector.register_counter(&MODEL_REQUEST_ERRORS);
    collector.register_counter(&MODEL_RATE_LIMITED);
    collector.register_moments(&MODEL_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&SEARCH_REQUESTS);
    collector.register_counter(&SEARCH_FAILURES);
    collector.register_moments(&SEARCH_DURATION);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_SEARCH_TURNS);
    collector.register_counter(&CHAT_FAILED_TURNS);
    collector.register_moments(&CHAT_TURN_DURATION);
}
