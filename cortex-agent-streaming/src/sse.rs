//! Server-Sent Events decoding.
//!
//! Decoding happens in two steps. [`LineDecoder`] turns arbitrary byte chunks
//! into complete lines, and [`FrameDecoder`] turns lines into [`SseFrame`]s.
//!
//! The agent API has a quirk the decoder preserves: an `event:` line names
//! every following `data:` line until the next `event:` line, even across
//! blank-line frame boundaries.

use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

const EVENT_PREFIX: &str = "event: ";
/// Prefix of an SSE data line.
pub const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Splits a byte stream into lines.
///
/// Bytes are buffered until a `\n` arrives, so multi-byte UTF-8 sequences
/// split across chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create a new line decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line they complete.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped.
    pub fn feed(&mut self, bytes: &[u8]) -> StreamResult<Vec<String>> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&raw[..raw.len() - 1]));
        }

        if self.buffer.len() > MAX_BUFFER_SIZE {
            self.buffer.clear();
            return Err(StreamError::BufferOverflow {
                limit: MAX_BUFFER_SIZE,
            });
        }

        Ok(lines)
    }

    /// Flush a trailing line that never got its terminator.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

pin_project! {
    /// Stream adapter that yields lines from a byte stream.
    pub struct LineStream<S> {
        #[pin]
        inner: S,
        decoder: LineDecoder,
        pending: VecDeque<String>,
        finished: bool,
    }
}

impl<S> LineStream<S> {
    /// Create a new line stream from a byte stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            decoder: LineDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: From<StreamError>,
{
    type Item = Result<String, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(line) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => match this.decoder.feed(&bytes) {
                    Ok(lines) => this.pending.extend(lines),
                    Err(error) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(error.into())));
                    }
                },
                Poll::Ready(Some(Err(error))) => return Poll::Ready(Some(Err(error))),
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.pending.extend(this.decoder.finish());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Payload of a data line.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    /// A single JSON object.
    Json(Value),
    /// A legacy observability trace array.
    Trace(Vec<Value>),
}

/// A decoded data frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    /// Event name in effect when the data line arrived.
    pub event: Option<String>,
    /// The parsed payload.
    pub payload: FramePayload,
}

impl SseFrame {
    /// Create a JSON frame.
    #[must_use]
    pub fn json(event: Option<&str>, payload: Value) -> Self {
        Self {
            event: event.map(str::to_string),
            payload: FramePayload::Json(payload),
        }
    }
}

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    /// A data frame.
    Frame(SseFrame),
    /// The `[DONE]` sentinel; nothing after it is decoded.
    Done,
}

/// Turns SSE lines into frames, tracking the sticky event name.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    current_event: Option<String>,
    done: bool,
    skipped: usize,
}

impl FrameDecoder {
    /// Create a new frame decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Event name currently in effect.
    #[must_use]
    pub fn current_event(&self) -> Option<&str> {
        self.current_event.as_deref()
    }

    /// Check if the `[DONE]` sentinel has been seen.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of data lines skipped because they failed to parse.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Decode one line.
    ///
    /// Returns `None` for event lines, ignorable lines, malformed data, and
    /// every line after `[DONE]`.
    pub fn decode_line(&mut self, line: &str) -> Option<DecodedLine> {
        if self.done {
            return None;
        }

        if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
            self.current_event = Some(name.trim().to_string());
            return None;
        }

        let data = line.strip_prefix(DATA_PREFIX)?.trim();

        if data == DONE_SENTINEL {
            self.done = true;
            return Some(DecodedLine::Done);
        }

        let payload = if data.starts_with('[') {
            serde_json::from_str::<Vec<Value>>(data).map(FramePayload::Trace)
        } else {
            serde_json::from_str::<Value>(data).map(FramePayload::Json)
        };

        match payload {
            Ok(FramePayload::Json(value)) if !value.is_object() => {
                self.skip(data, "payload is not an object");
                None
            }
            Ok(payload) => Some(DecodedLine::Frame(SseFrame {
                event: self.current_event.clone(),
                payload,
            })),
            Err(e) => {
                self.skip(data, &e.to_string());
                None
            }
        }
    }

    fn skip(&mut self, data: &str, reason: &str) {
        self.skipped += 1;
        debug!(
            event = ?self.current_event,
            reason,
            len = data.len(),
            "Skipping malformed data line"
        );
    }
}
