use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::http::request::Version;
use crate::http::response::StatusCode;

/// A transport wrapped with the configured network timeout.
///
/// The stream type is generic so the same pipeline runs over a plain
/// `TcpStream`, a TLS stream, or an in-memory duplex in tests. Every
/// operation is bounded by the timeout; exceeding it fails the operation and
/// the connection is torn down by the caller.
pub struct HttpStream<S> {
    stream: S,
    timeout: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin> HttpStream<S> {
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self { stream, timeout }
    }

    /// Sends the whole buffer, looping over short writes.
    ///
    /// Each individual write attempt is bounded by the network timeout. A
    /// zero-length write is treated as a closed peer so a dead socket cannot
    /// spin this loop.
    pub async fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut written = 0;

        while written < buf.len() {
            let n = match timeout(self.timeout, self.stream.write(&buf[written..])).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(io::Error::new(io::ErrorKind::TimedOut, "send timed out"));
                }
            };

            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            written += n;
        }

        Ok(())
    }

    /// Reads into the buffer, bounded by the network timeout.
    ///
    /// Returns the number of bytes read; 0 means the peer closed.
    pub async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match timeout(self.timeout, self.stream.read(buf)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "recv timed out")),
        }
    }

    /// Sends one chunk of a chunked-encoded body.
    ///
    /// A non-empty payload is framed as an uppercase-hex length line, the
    /// payload, and a trailing CRLF. An empty payload emits the terminator
    /// `0\r\n\r\n`.
    pub async fn send_chunk(&mut self, payload: &[u8]) -> io::Result<()> {
        if payload.is_empty() {
            return self.send(b"0\r\n\r\n").await;
        }

        self.send(format!("{:X}\r\n", payload.len()).as_bytes()).await?;
        self.send(payload).await?;
        self.send(b"\r\n").await
    }

    /// Sends a body fragment with version-appropriate framing: chunked for
    /// HTTP/1.1, raw bytes otherwise. An empty fragment emits the chunked
    /// terminator on HTTP/1.1 and nothing on older versions.
    pub async fn send_body(&mut self, version: Version, payload: &[u8]) -> io::Result<()> {
        if version > Version::V10 {
            self.send_chunk(payload).await
        } else if !payload.is_empty() {
            self.send(payload).await
        } else {
            Ok(())
        }
    }

    /// Emits a complete plain-text error response.
    ///
    /// Used on paths where no request version is pinned, so the status line
    /// is always HTTP/1.1 and the body is chunk-encoded.
    pub async fn send_error(&mut self, status: StatusCode, body: &str) -> io::Result<()> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Connection: close\r\n\
             Content-Type: text/plain\r\n\
             Transfer-Encoding: chunked\r\n\r\n",
            status.as_u16(),
            status.reason_phrase()
        );

        self.send(head.as_bytes()).await?;
        self.send_chunk(body.as_bytes()).await?;
        self.send_chunk(b"").await
    }

    /// Shuts the transport down, flushing what the peer will still accept.
    pub async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
