//! Accumulates streamed answer fragments into the final text while passing them through.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::generator::TextStream;

/// A stream wrapper that accumulates text fragments into a complete answer.
///
/// This allows rendering fragments as they arrive while simultaneously building the text that
/// gets stored once the answer is complete.  When the stream is fully drained the accumulated
/// text is sent via the oneshot channel returned by `new()`.  If the stream yielded an error,
/// that error is sent instead, so a partial answer is never mistaken for a complete one.
pub struct AccumulatingStream {
    inner: TextStream,
    text_tx: Option<oneshot::Sender<Result<String, Error>>>,
    text: String,
    error: Option<Error>,
}

impl AccumulatingStream {
    /// Wraps a fragment stream to accumulate it into a `String`.
    ///
    /// Returns the stream and a receiver that will contain the accumulated text once the
    /// stream is fully drained.
    pub fn new(inner: TextStream) -> (Self, oneshot::Receiver<Result<String, Error>>) {
        let (tx, rx) = oneshot::channel();
        let this = Self {
            inner,
            text_tx: Some(tx),
            text: String::new(),
            error: None,
        };
        (this, rx)
    }

    /// The text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn finalize(&mut self) -> Result<String, Error> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(std::mem::take(&mut self.text)),
        }
    }
}

impl Stream for AccumulatingStream {
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                self.text.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(e))) => {
                if self.error.is_none() {
                    self.error = Some(e.clone());
                }
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if let Some(tx) = self.text_tx.take() {
                    let result = self.finalize();
                    let _ = tx.send(result);
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::stream;

    #[tokio::test]
    async fn accumulates_all_fragments() {
        let fragments = stream::iter(vec![
            Ok("The ".to_string()),
            Ok("answer ".to_string()),
            Ok("is 42.".to_string()),
        ]);
        let (mut acc_stream, rx) = AccumulatingStream::new(Box::pin(fragments));

        let mut seen = Vec::new();
        while let Some(fragment) = acc_stream.next().await {
            seen.push(fragment.unwrap());
        }
        assert_eq!(seen, vec!["The ", "answer ", "is 42."]);

        let text = rx.await.unwrap().unwrap();
        assert_eq!(text, "The answer is 42.");
    }

    #[tokio::test]
    async fn error_replaces_partial_text() {
        let fragments = stream::iter(vec![
            Ok("partial".to_string()),
            Err(Error::rate_limit("quota", None)),
        ]);
        let (mut acc_stream, rx) = AccumulatingStream::new(Box::pin(fragments));
        while acc_stream.next().await.is_some() {}
        assert_eq!(acc_stream.text(), "partial");

        let err = rx.await.unwrap().unwrap_err();
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn dropped_stream_closes_channel() {
        let fragments = stream::iter(vec![Ok("never drained".to_string())]);
        let (acc_stream, rx) = AccumulatingStream::new(Box::pin(fragments));
        drop(acc_stream);
        assert!(rx.await.is_err());
    }
}
