// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental decoder for streaming chat completion responses.
//!
//! The upstream body is a sequence of Server-Sent Events records, each a
//! `data:` line holding one JSON chunk, terminated by `data: [DONE]`.
//! `eventsource-stream` handles record framing across arbitrary byte chunk
//! boundaries; this module turns each record into zero or one text delta.

use std::fmt;

use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::{Stream, StreamExt};
use safespace_core::{DeltaStream, SafeSpaceError};
use tracing::debug;

use crate::types::StreamChunk;

/// Terminal sentinel sent as the last record's data.
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single upstream record decoded to.
#[derive(Debug)]
enum Record {
    Delta(String),
    /// Well-formed record without text (role announcement, finish reason).
    Empty,
    /// Unparsable record; skipped.
    Malformed,
    Done,
    Failed(SafeSpaceError),
}

fn parse_record(data: &str) -> Record {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Record::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk.into_text().map_or(Record::Empty, Record::Delta),
        Err(e) => {
            debug!(error = %e, "skipping malformed stream record");
            Record::Malformed
        }
    }
}

/// Decode a raw upstream byte stream into text deltas.
///
/// The returned stream ends at the `[DONE]` sentinel or when the body ends.
/// A malformed record is skipped; a transport or framing error is yielded as
/// one `Err` item.
pub fn decode_deltas<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let records = decode_lossy(bytes).eventsource().map(|result| match result {
        Ok(event) => parse_record(&event.data),
        Err(e) => Record::Failed(SafeSpaceError::Provider {
            message: format!("upstream stream error: {e}"),
            status: None,
            source: None,
        }),
    });

    let deltas = records
        .take_while(|record| future::ready(!matches!(record, Record::Done)))
        .filter_map(|record| {
            future::ready(match record {
                Record::Delta(text) => Some(Ok(text)),
                Record::Failed(err) => Some(Err(err)),
                Record::Empty | Record::Malformed | Record::Done => None,
            })
        });

    Box::pin(deltas)
}

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD.
///
/// A sequence cut off at the end of a chunk is carried into the next chunk.
fn decode_lossy<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
{
    bytes.scan(Vec::new(), |carry: &mut Vec<u8>, item| {
        let decoded = item.map(|chunk| {
            carry.extend_from_slice(chunk.as_ref());
            take_utf8(carry)
        });
        future::ready(Some(decoded))
    })
}

/// Drain the decodable prefix of `buf`, leaving an incomplete trailing sequence.
fn take_utf8(buf: &mut Vec<u8>) -> String {
    let mut out = String::with_capacity(buf.len());
    let mut start = 0;
    while start < buf.len() {
        match std::str::from_utf8(&buf[start..]) {
            Ok(text) => {
                out.push_str(text);
                start = buf.len();
            }
            Err(e) => {
                let valid = start + e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&buf[start..valid]));
                match e.error_len() {
                    Some(len) => {
                        debug!(offset = valid, "replacing invalid UTF-8 in upstream stream");
                        out.push(char::REPLACEMENT_CHARACTER);
                        start = valid + len;
                    }
                    None => {
                        start = valid;
                        break;
                    }
                }
            }
        }
    }
    buf.drain(..start);
    out
}
