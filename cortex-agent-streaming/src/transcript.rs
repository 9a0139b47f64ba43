//! Recorded stream transcripts.
//!
//! A transcript is a text dump of one or more captured streams, each block
//! introduced by a line starting with `Sample response`. Useful for replaying
//! production captures through the aggregator offline.

use cortex_agent_core::CortexResponse;
use serde_json::Value;
use tracing::debug;

use crate::aggregator::ResponseAggregator;
use crate::sse::{DecodedLine, FrameDecoder, FramePayload};
use crate::trace;

/// Prefix of the line that opens a transcript block.
pub const BLOCK_MARKER: &str = "Sample response";

/// Aggregate a complete recorded stream.
pub fn parse_sse_lines<I, S>(lines: I) -> CortexResponse
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregator = ResponseAggregator::new();
    for line in lines {
        aggregator.ingest_line(line.as_ref());
        if aggregator.is_done() {
            break;
        }
    }
    aggregator.finalize()
}

/// Split a transcript into blocks of trimmed, non-empty lines.
///
/// Text without any marker is treated as a single block.
#[must_use]
pub fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let has_markers = text
        .lines()
        .any(|line| line.trim().starts_with(BLOCK_MARKER));
    if !has_markers {
        let block: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        return if block.is_empty() { Vec::new() } else { vec![block] };
    }

    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in text.lines().map(str::trim) {
        if line.starts_with(BLOCK_MARKER) {
            blocks.extend(current.take().filter(|b| !b.is_empty()));
            current = Some(Vec::new());
        } else if let Some(block) = current.as_mut() {
            if !line.is_empty() {
                block.push(line);
            }
        }
    }
    blocks.extend(current.filter(|b| !b.is_empty()));
    blocks
}

/// Parse every block of a transcript.
///
/// A block that yields no messages but carries trace arrays is read through
/// trace extraction instead.
#[must_use]
pub fn parse_transcript(text: &str) -> Vec<CortexResponse> {
    split_blocks(text)
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            let response = parse_sse_lines(&block);
            if !response.messages.is_empty() {
                return response;
            }
            let traces = collect_traces(&block);
            if traces.is_empty() {
                return response;
            }
            debug!(block = index, traces = traces.len(), "Falling back to trace extraction");
            trace::extract_response(traces.iter().map(Vec::as_slice))
        })
        .collect()
}

fn collect_traces(lines: &[&str]) -> Vec<Vec<Value>> {
    let mut decoder = FrameDecoder::new();
    lines
        .iter()
        .filter_map(|line| match decoder.decode_line(line)? {
            DecodedLine::Frame(frame) => match frame.payload {
                FramePayload::Trace(items) => Some(items),
                FramePayload::Json(_) => None,
            },
            DecodedLine::Done => None,
        })
        .collect()
}
