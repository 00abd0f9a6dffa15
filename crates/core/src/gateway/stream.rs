//! Helpers for turning HTTP response bodies into text fragments.
//!
//! Providers deliver output as raw chunked text (the hybrid backend), as
//! line-delimited records (Ollama NDJSON) or as Server-Sent Events (OpenAI
//! and Gemini).

use crate::gateway::base::{GatewayError, TextStream};
use eventsource_stream::{EventStreamError, Eventsource};
use std::io;
use std::pin::Pin;
use tokio::io::AsyncBufReadExt;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::StreamReader;

/// Lines of a response body, without their terminators.
///
/// Also used for SSE `data` payloads, one item per dispatched event.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// Incremental UTF-8 decoder that carries incomplete sequences over to the
/// next chunk.
///
/// Network chunks may split a multi-byte character. Bytes that can never
/// form a valid sequence are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return everything that can be decoded so far.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            // Incomplete trailing sequence: keep it for the next chunk.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is left at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Stream a response body as UTF-8 text fragments, one per network chunk.
pub fn text_fragments(response: reqwest::Response) -> TextStream {
    let mut bytes = response.bytes_stream();
    let stream = async_stream::stream! {
        let mut decoder = Utf8Decoder::new();
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    let text = decoder.push(&chunk);
                    if !text.is_empty() {
                        yield Ok::<String, GatewayError>(text);
                    }
                }
                Err(err) => {
                    yield Err(GatewayError::from(err));
                    return;
                }
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            yield Ok(tail);
        }
    };
    Box::pin(stream)
}

/// Stream a response body line by line.
pub fn response_lines(response: reqwest::Response) -> LineStream {
    let bytes = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(io::Error::other));
    let lines = LinesStream::new(StreamReader::new(bytes).lines());
    Box::pin(lines.map(|line| line.map_err(line_error)))
}

fn line_error(err: io::Error) -> GatewayError {
    if err.kind() == io::ErrorKind::InvalidData {
        GatewayError::Stream(format!("response body is not valid UTF-8: {err}"))
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/// Stream the `data` payload of each Server-Sent Event in a response body.
///
/// Multi-line `data:` fields are joined with `\n`; comments and events
/// without data are dropped.
pub fn sse_payloads(response: reqwest::Response) -> LineStream {
    let events = response.bytes_stream().eventsource();
    let payloads = events.filter_map(|event| match event {
        Ok(event) if event.data.is_empty() => None,
        Ok(event) => Some(Ok(event.data)),
        Err(err) => Some(Err(sse_error(err))),
    });
    Box::pin(payloads)
}

fn sse_error(err: EventStreamError<reqwest::Error>) -> GatewayError {
    match err {
        EventStreamError::Transport(err) => GatewayError::from(err),
        other => GatewayError::Stream(format!("invalid event stream: {other}")),
    }
}

/// Turn a non-2xx response into `GatewayError::Status`.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}
