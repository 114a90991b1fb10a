//! Length-prefixed JSON framing over byte streams, using HTTP-style headers.
//!
//! Wire shape:
//! ```text
//! Content-Length: <N>\r\n
//! Content-Type: application/vscode-jsonrpc; charset=utf8\r\n
//! \r\n
//! <N bytes of UTF-8 JSON>
//! ```

mod reader;
mod writer;

pub use reader::{FrameReader, FrameReaderCloser};
pub use writer::FrameWriter;

pub(crate) const CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf8";
