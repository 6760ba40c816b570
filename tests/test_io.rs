use std::time::Duration;

use palisade::http::io::HttpStream;
use palisade::http::request::Version;
use palisade::http::response::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn collect(mut client: tokio::io::DuplexStream) -> Vec<u8> {
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn test_send_chunk_framing_and_terminator() {
    let (client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    io.send_chunk(b"hello").await.unwrap();
    io.send_chunk(b"").await.unwrap();
    drop(io);

    assert_eq!(collect(client).await, b"5\r\nhello\r\n0\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_chunk_length_is_uppercase_hex_without_leading_zeros() {
    let (client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    io.send_chunk(&[b'x'; 255]).await.unwrap();
    io.send_chunk(&[b'y'; 16]).await.unwrap();
    drop(io);

    let out = collect(client).await;
    let text = String::from_utf8_lossy(&out);
    assert!(text.starts_with("FF\r\n"));
    assert!(text.contains("\r\n10\r\n"));
}

#[tokio::test]
async fn test_chunked_stream_reassembles_to_original() {
    let (client, server) = tokio::io::duplex(65536);
    let mut io = HttpStream::new(server, TIMEOUT);

    let payloads: [&[u8]; 3] = [b"first", b"second fragment", &[0xAB; 300]];
    for p in payloads {
        io.send_chunk(p).await.unwrap();
    }
    io.send_chunk(b"").await.unwrap();
    drop(io);

    // walk the frames: hex length line, payload, CRLF
    let out = collect(client).await;
    let mut decoded = Vec::new();
    let mut rest = &out[..];
    loop {
        let line_end = rest.windows(2).position(|w| w == b"\r\n").unwrap();
        let len = usize::from_str_radix(std::str::from_utf8(&rest[..line_end]).unwrap(), 16).unwrap();
        rest = &rest[line_end + 2..];
        if len == 0 {
            assert_eq!(rest, b"\r\n");
            break;
        }
        decoded.extend_from_slice(&rest[..len]);
        assert_eq!(&rest[len..len + 2], b"\r\n");
        rest = &rest[len + 2..];
    }

    let expected: Vec<u8> = payloads.concat();
    assert_eq!(decoded, expected);
}

#[tokio::test]
async fn test_send_body_is_raw_for_http_10() {
    let (client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    io.send_body(Version::V10, b"payload").await.unwrap();
    // an empty 1.0 fragment emits nothing at all
    io.send_body(Version::V10, b"").await.unwrap();
    drop(io);

    assert_eq!(collect(client).await, b"payload".to_vec());
}

#[tokio::test]
async fn test_send_body_is_chunked_for_http_11() {
    let (client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    io.send_body(Version::V11, b"payload").await.unwrap();
    io.send_body(Version::V11, b"").await.unwrap();
    drop(io);

    assert_eq!(collect(client).await, b"7\r\npayload\r\n0\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_send_error_shape() {
    let (client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    io.send_error(StatusCode::NotFound, "No such file or directory")
        .await
        .unwrap();
    drop(io);

    let out = collect(client).await;
    let text = String::from_utf8_lossy(&out);
    assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.contains("Content-Type: text/plain\r\n"));
    assert!(text.contains("Transfer-Encoding: chunked\r\n"));
    assert!(text.ends_with("19\r\nNo such file or directory\r\n0\r\n\r\n"));
}

#[tokio::test]
async fn test_recv_reads_available_bytes() {
    let (mut client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    client.write_all(b"GET /").await.unwrap();

    let mut buf = [0u8; 64];
    let n = io.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"GET /");
}

#[tokio::test]
async fn test_recv_returns_zero_on_closed_peer() {
    let (client, server) = tokio::io::duplex(4096);
    let mut io = HttpStream::new(server, TIMEOUT);

    drop(client);

    let mut buf = [0u8; 64];
    assert_eq!(io.recv(&mut buf).await.unwrap(), 0);
}

#[tokio::test]
async fn test_send_times_out_against_a_stalled_peer() {
    // tiny transfer buffer and nobody reading on the other side
    let (_client, server) = tokio::io::duplex(4);
    let mut io = HttpStream::new(server, Duration::from_millis(100));

    let err = io.send(&[b'x'; 64]).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
}
