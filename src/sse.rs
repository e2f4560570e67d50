//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! `streamGenerateContent?alt=sse` answers with one `data:` event per chunk.  This module turns
//! the raw byte stream into a stream of parsed [`GenerateContentResponse`] values, buffering
//! partial events and partial UTF-8 sequences across network reads.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::client::{ApiErrorDetail, error_for_status};
use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::{Error, GenerateContentResponse, Result};

/// Process a stream of bytes into a stream of response chunks.
///
/// Transport failures and provider error events are yielded as `Err` items.  The stream ends
/// when the underlying byte stream ends.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, String::new(), Vec::new()),
        move |(mut stream, mut buffer, mut pending)| async move {
            loop {
                while let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    if let Some(event) = event {
                        count(&event);
                        return Some((event, (stream, buffer, pending)));
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        if let Err(err) = drain_utf8(&mut pending, &mut buffer) {
                            STREAM_ERRORS.click();
                            return Some((Err(err), (stream, buffer, pending)));
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, pending)));
                    }
                    None => {
                        if !pending.is_empty() {
                            let stranded = pending.len();
                            pending.clear();
                            buffer.clear();
                            STREAM_ERRORS.click();
                            return Some((
                                Err(Error::encoding(
                                    format!(
                                        "Stream ended inside a UTF-8 sequence ({stranded} bytes pending)"
                                    ),
                                    None,
                                )),
                                (stream, buffer, pending),
                            ));
                        }
                        // A final event may lack its trailing blank line.
                        if !buffer.trim().is_empty() {
                            let tail = std::mem::take(&mut buffer);
                            if let Some(event) = parse_event(&tail) {
                                count(&event);
                                return Some((event, (stream, buffer, pending)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

fn count(event: &Result<GenerateContentResponse>) {
    match event {
        Ok(_) => STREAM_CHUNKS.click(),
        Err(_) => STREAM_ERRORS.click(),
    }
}

/// Move every complete UTF-8 sequence from `pending` into `buffer`, normalizing CRLF.
///
/// An incomplete multi-byte sequence at the end of `pending` is left for the next read.
fn drain_utf8(pending: &mut Vec<u8>, buffer: &mut String) -> Result<()> {
    let valid = match std::str::from_utf8(pending) {
        Ok(text) => text.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => {
            pending.clear();
            return Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ));
        }
    };
    let rest = pending.split_off(valid);
    let text = std::str::from_utf8(pending)?;
    buffer.push_str(text);
    *pending = rest;
    if buffer.contains('\r') {
        *buffer = buffer.replace("\r\n", "\n");
    }
    Ok(())
}

/// Extract a complete SSE event from a buffer string.
///
/// Returns `None` when no complete event is buffered.  Otherwise returns the parsed event (or
/// `None` for events that carry no data, such as keep-alive comments) and the rest of the buffer.
#[allow(clippy::type_complexity)]
fn extract_event(buffer: &str) -> Option<(Option<Result<GenerateContentResponse>>, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    Some((parse_event(event_text), rest.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error { error: ApiErrorDetail },
    Chunk(GenerateContentResponse),
}

fn parse_event(event_text: &str) -> Option<Result<GenerateContentResponse>> {
    let data = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>();
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    match serde_json::from_str::<StreamPayload>(&data) {
        Ok(StreamPayload::Chunk(chunk)) => Some(Ok(chunk)),
        Ok(StreamPayload::Error { error }) => Some(Err(error_for_status(
            error.code.unwrap_or(500),
            error.status,
            error.message.unwrap_or_else(|| data.clone()),
            None,
        ))),
        Err(e) => Some(Err(Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        ))),
    }
}
