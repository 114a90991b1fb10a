use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

use super::CONTENT_TYPE;

/// Serializes messages into framed byte payloads and writes them to a single
/// sink, one frame at a time.
///
/// Writes are serialized by an internal mutex so concurrent callers never
/// interleave frames. Writing after `close()` is a silent no-op; serialization
/// or I/O failures are logged and swallowed so the stream remains usable for
/// subsequent writes.
pub struct FrameWriter<W> {
    sink: Mutex<Option<W>>,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(Some(sink)),
        }
    }

    pub async fn write<T: Serialize>(&self, message: &T) {
        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return;
        };

        let body = match serde_json::to_vec(message) {
            Ok(b) => b,
            Err(e) => {
                warn!("failed to serialize outbound message: {e}");
                return;
            }
        };

        let header = format!(
            "Content-Length: {}\r\nContent-Type: {}\r\n\r\n",
            body.len(),
            CONTENT_TYPE
        );

        if let Err(e) = sink.write_all(header.as_bytes()).await {
            warn!("failed to write frame header: {e}");
            return;
        }
        if let Err(e) = sink.write_all(&body).await {
            warn!("failed to write frame body: {e}");
            return;
        }
        if let Err(e) = sink.flush().await {
            warn!("failed to flush frame: {e}");
        }
    }

    /// Flushes and releases the underlying sink. Subsequent writes are no-ops.
    pub async fn close(&self) {
        let mut guard = self.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            let _ = sink.flush().await;
            let _ = sink.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn writes_exact_frame() {
        let buf = Vec::new();
        let writer = FrameWriter::new(buf);
        writer
            .write(&json!({"id": "hello", "method": "method", "params": {}}))
            .await;

        // Drain the sink by closing (flush/shutdown are no-ops on Vec<u8>).
        let mut guard = writer.sink.lock().await;
        let bytes = guard.take().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let expected_body = r#"{"id":"hello","method":"method","params":{}}"#;
        let expected = format!(
            "Content-Length: {}\r\nContent-Type: {}\r\n\r\n{}",
            expected_body.len(),
            CONTENT_TYPE,
            expected_body
        );
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn write_after_close_is_noop() {
        let writer = FrameWriter::new(Vec::new());
        writer.close().await;
        writer.write(&json!({"method": "m"})).await;
        assert!(writer.sink.lock().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_writes_never_interleave() {
        use std::sync::Arc;

        let writer = Arc::new(FrameWriter::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..8 {
            let writer = writer.clone();
            handles.push(tokio::spawn(async move {
                writer.write(&json!({"method": format!("m{i}")})).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let mut guard = writer.sink.lock().await;
        let bytes = guard.take().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        // Every frame must parse: if bytes interleaved, at least one
        // Content-Length would not match its body.
        let mut rest = text.as_str();
        let mut count = 0;
        while !rest.is_empty() {
            let header_end = rest.find("\r\n\r\n").expect("well-formed header");
            let header = &rest[..header_end];
            let len: usize = header
                .lines()
                .find_map(|l| l.strip_prefix("Content-Length: "))
                .expect("content-length present")
                .parse()
                .expect("integer length");
            let body_start = header_end + 4;
            let body = &rest[body_start..body_start + len];
            assert!(serde_json::from_str::<serde_json::Value>(body).is_ok());
            rest = &rest[body_start + len..];
            count += 1;
        }
        assert_eq!(count, 8);
    }
}
