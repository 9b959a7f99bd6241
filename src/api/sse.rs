//! Server-sent events decoding.
//!
//! Turns the raw byte chunks of a `text/event-stream` response into discrete
//! events. Comment lines (`: ping`, `: heartbeat`) are dropped here.

use crate::error::{ClientError, Result};
use futures::stream::{BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `event:` field; `None` means the default `message` type
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

/// Longest line kept while waiting for its newline. A completed scan sends
/// every duplicate group in one `data:` line, so this is generous.
pub const MAX_LINE_LEN: usize = 16 * 1024 * 1024;

/// Incremental line parser for the event-stream format
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes of the unfinished line held back for the next chunk
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {} // `id`, `retry` and unknown fields
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Stream of decoded events over a stream of body chunks
///
/// An incomplete event at end of body is discarded. A line longer than
/// [`MAX_LINE_LEN`] ends the stream with an error after the events before it.
pub struct SseStream {
    chunks: BoxStream<'static, Result<Vec<u8>>>,
    decoder: SseDecoder,
    ready: VecDeque<SseEvent>,
    error: Option<ClientError>,
    finished: bool,
}

impl SseStream {
    pub fn new<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>>> + Send + 'static,
    {
        Self {
            chunks: chunks.boxed(),
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
            error: None,
            finished: false,
        }
    }
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream")
            .field("chunks", &"<body stream>")
            .field("pending", &self.decoder.pending_len())
            .field("ready", &self.ready.len())
            .field("error", &self.error)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Stream for SseStream {
    type Item = Result<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if let Some(e) = this.error.take() {
                return Poll::Ready(Some(Err(e)));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.chunks.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    this.ready.extend(this.decoder.feed(&chunk));
                    if this.decoder.pending_len() > MAX_LINE_LEN {
                        this.finished = true;
                        this.error = Some(ClientError::Stream(format!(
                            "event stream line exceeds {} bytes",
                            MAX_LINE_LEN
                        )));
                    }
                }
                Some(Err(e)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => this.finished = true,
            }
        }
    }
}
