use std::future::Future;
use std::io;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::Notify;
use tracing::{debug, warn};

const CONTENT_LENGTH_HEADER: &str = "Content-Length: ";

enum Frame {
    Message(Value),
    BadFrame,
    Eof,
}

/// A handle that can force a [`FrameReader::listen`] loop to stop, feeding it
/// a synthetic EOF the way closing the underlying stream would.
#[derive(Clone)]
pub struct FrameReaderCloser(Arc<Notify>);

impl FrameReaderCloser {
    pub fn close(&self) {
        self.0.notify_waiters();
    }
}

/// Parses a byte stream into a lazy sequence of JSON payloads.
///
/// `listen` drives the stream until EOF (or `close()`), invoking `consumer`
/// for each successfully parsed message. The consumer is spawned as its own
/// task so a slow or async consumer never blocks the reader from making
/// progress on the next frame; messages are dispatched to the consumer in
/// stream order but may complete out of order.
pub struct FrameReader<R> {
    inner: R,
    closed: Arc<Notify>,
}

impl<R: AsyncBufRead + Unpin + Send + 'static> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            closed: Arc::new(Notify::new()),
        }
    }

    pub fn closer(&self) -> FrameReaderCloser {
        FrameReaderCloser(self.closed.clone())
    }

    pub async fn listen<F, Fut>(mut self, consumer: F) -> io::Result<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let consumer = Arc::new(consumer);
        loop {
            let frame = tokio::select! {
                _ = self.closed.notified() => {
                    debug!("frame reader closed");
                    return Ok(());
                }
                frame = read_frame(&mut self.inner) => frame?,
            };

            match frame {
                Frame::Message(value) => {
                    let consumer = consumer.clone();
                    tokio::spawn(async move {
                        consumer(value).await;
                    });
                }
                Frame::BadFrame => continue,
                Frame::Eof => return Ok(()),
            }
        }
    }
}

async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Frame> {
    let mut content_length: Option<usize> = None;
    let mut saw_any_line = false;
    let mut saw_header_error = false;

    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            // EOF before any line, or mid-headers: terminate cleanly either way.
            return Ok(Frame::Eof);
        }
        saw_any_line = true;

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }

        if let Some(rest) = trimmed.strip_prefix(CONTENT_LENGTH_HEADER) {
            match rest.trim().parse::<usize>() {
                Ok(n) => content_length = Some(n),
                Err(_) => {
                    warn!("invalid Content-Length header: {rest:?}");
                    saw_header_error = true;
                }
            }
        }
        // Content-Type and any other header is accepted in any order and ignored.
    }

    let _ = saw_any_line;

    let content_length = match content_length {
        Some(len) if !saw_header_error => len,
        _ => {
            warn!("missing or malformed Content-Length header, terminating reader");
            return Ok(Frame::Eof);
        }
    };

    let mut body = vec![0u8; content_length];
    if let Err(e) = reader.read_exact(&mut body).await {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return Ok(Frame::Eof);
        }
        return Err(e);
    }

    let text = match std::str::from_utf8(&body) {
        Ok(t) => t,
        Err(e) => {
            warn!("frame body was not valid UTF-8: {e}");
            return Ok(Frame::BadFrame);
        }
    };

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(Frame::Message(value)),
        Err(e) => {
            warn!("failed to parse JSON frame: {e}");
            Ok(Frame::BadFrame)
        }
    }
}
