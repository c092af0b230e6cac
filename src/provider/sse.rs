//! Incremental decoding of streamed HTTP bodies
//!
//! Network chunks split text at arbitrary byte offsets, including in the
//! middle of a multi-byte character or an SSE line. The two buffers here
//! hold back incomplete tails until the rest arrives.

use super::ChunkStream;
use crate::error::Result;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// UTF-8 decoder that carries incomplete code points across chunks
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Decode as much of `bytes` (plus any held-back tail) as is complete
    ///
    /// Invalid sequences become U+FFFD. A truncated sequence at the end is
    /// kept for the next call.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    /// Flush whatever is still held back, lossily
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Line buffer that extracts `data:` payloads from a server-sent event stream
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: String,
}

impl SseLineBuffer {
    /// Feed decoded text and return the payloads of every completed `data:` line
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Payload of a final line that arrived without a trailing newline
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}

/// Marker OpenAI sends as the last SSE payload
const DONE: &str = "[DONE]";

/// Turn an SSE response into a [`ChunkStream`] of text deltas
///
/// `extract` maps one `data:` payload to the text it carries (`None` for
/// payloads without text). A background task reads the body and forwards
/// deltas in order; it stops early when the receiver is dropped.
pub(crate) fn sse_text_stream<F>(
    response: reqwest::Response,
    provider: &'static str,
    extract: F,
) -> ChunkStream
where
    F: Fn(&str) -> Result<Option<String>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        if let Err(e) = pump_sse(response, &tx, extract).await {
            tracing::warn!(provider, error = %e, "stream aborted");
            let _ = tx.send(Err(e)).await;
        }
    });

    ReceiverStream::new(rx).boxed()
}

async fn pump_sse<F>(
    response: reqwest::Response,
    tx: &mpsc::Sender<Result<String>>,
    extract: F,
) -> Result<()>
where
    F: Fn(&str) -> Result<Option<String>>,
{
    let mut body = response.bytes_stream();
    let mut decoder = Utf8ChunkDecoder::default();
    let mut lines = SseLineBuffer::default();

    while let Some(bytes) = body.next().await {
        let bytes = bytes?;
        for payload in lines.push(&decoder.push(&bytes)) {
            if payload == DONE {
                return Ok(());
            }
            if let Some(text) = extract(&payload)?
                && tx.send(Ok(text)).await.is_err()
            {
                return Ok(());
            }
        }
    }

    let tail = decoder.finish();
    let mut payloads = lines.push(&tail);
    payloads.extend(lines.finish());
    for payload in payloads {
        if payload == DONE {
            break;
        }
        if let Some(text) = extract(&payload)?
            && tx.send(Ok(text)).await.is_err()
        {
            break;
        }
    }

    Ok(())
}

/// Turn a raw text body into a [`ChunkStream`], decoding UTF-8 across chunks
pub(crate) fn text_body_stream(response: reqwest::Response, provider: &'static str) -> ChunkStream {
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut decoder = Utf8ChunkDecoder::default();
        while let Some(bytes) = body.next().await {
            match bytes {
                Ok(bytes) => {
                    if tx.send(Ok(decoder.push(&bytes))).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(provider, error = %e, "stream aborted");
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            let _ = tx.send(Ok(tail)).await;
        }
    });

    ReceiverStream::new(rx).boxed()
}
