//! HTTP/1.1 upgrade handshake.
//!
//! The server's `Sec-WebSocket-Accept` header is not checked against the
//! key: any response carrying `101 Switching Protocols` is accepted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ConnectionError;
use crate::Result;

/// Upper bound on the response head we are willing to read.
pub const RESPONSE_BUFFER_SIZE: usize = 1024;

const SWITCHING_PROTOCOLS: &[u8] = b"101 Switching Protocols";
const HEAD_END: &[u8] = b"\r\n\r\n";

/// Outcome of one upgrade attempt.
#[derive(Clone, Debug)]
pub struct HandshakeResult {
    pub accepted: bool,
    pub raw_response: Vec<u8>,
}

impl HandshakeResult {
    fn rejected(raw_response: Vec<u8>) -> Self {
        Self {
            accepted: false,
            raw_response,
        }
    }
}

/// Random 16-byte nonce, base64 encoded, for `Sec-WebSocket-Key`.
pub fn generate_key() -> String {
    STANDARD.encode(rand::random::<[u8; 16]>())
}

/// Build the upgrade request.
pub fn build_request(host: &str, port: u16, path: &str, key: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}:{port}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n"
    )
}

/// Send the upgrade request over `stream` and check the response.
///
/// A failed write is a connection error. A failed or short read only
/// produces a rejected result.
pub async fn perform<S>(stream: &mut S, host: &str, port: u16, path: &str) -> Result<HandshakeResult>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = build_request(host, port, path, &generate_key());
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(ConnectionError::Io)?;
    stream.flush().await.map_err(ConnectionError::Io)?;

    let response = match read_response_head(stream).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "handshake response read failed");
            return Ok(HandshakeResult::rejected(Vec::new()));
        }
    };

    let accepted = contains(&response, SWITCHING_PROTOCOLS);
    Ok(HandshakeResult {
        accepted,
        raw_response: response,
    })
}

/// Read the response head one byte at a time so that no frame bytes sent
/// right after the head are consumed here.
async fn read_response_head<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    while buf.len() < RESPONSE_BUFFER_SIZE {
        if reader.read(&mut byte).await? == 0 {
            break;
        }
        buf.push(byte[0]);
        if buf.ends_with(HEAD_END) {
            break;
        }
    }
    Ok(buf)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncBufReadExt, BufReader};

    const ACCEPT: &str = "HTTP/1.1 101 Switching Protocols\r\n\
                          Upgrade: websocket\r\n\
                          Connection: Upgrade\r\n\
                          Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";

    /// Plays the server: reads the request head, answers with `response`,
    /// and returns the request lines it saw.
    async fn serve_once(
        server: tokio::io::DuplexStream,
        response: &'static [u8],
    ) -> Vec<String> {
        let mut reader = BufReader::new(server);
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            lines.push(line.trim_end().to_string());
        }
        reader.get_mut().write_all(response).await.unwrap();
        lines
    }

    #[test]
    fn key_is_base64_of_sixteen_bytes() {
        let key = generate_key();
        assert_eq!(key.len(), 24);
        assert_eq!(STANDARD.decode(&key).unwrap().len(), 16);
        assert_ne!(key, generate_key());
    }

    #[test]
    fn request_has_upgrade_headers() {
        let req = build_request("10.0.0.2", 8765, "/lamp", "dGhlIHNhbXBsZSBub25jZQ==");
        assert!(req.starts_with("GET /lamp HTTP/1.1\r\n"));
        assert!(req.contains("Host: 10.0.0.2:8765\r\n"));
        assert!(req.contains("Upgrade: websocket\r\n"));
        assert!(req.contains("Connection: Upgrade\r\n"));
        assert!(req.contains("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n"));
        assert!(req.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(req.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn accepts_switching_protocols() {
        let (mut client, server) = duplex(4096);
        let server = tokio::spawn(serve_once(server, ACCEPT.as_bytes()));
        let result = perform(&mut client, "lamp.local", 8765, "/").await.unwrap();
        assert!(result.accepted);
        assert_eq!(result.raw_response, ACCEPT.as_bytes());

        let lines = server.await.unwrap();
        assert_eq!(lines[0], "GET / HTTP/1.1");
        assert!(lines.iter().any(|l| l.starts_with("Sec-WebSocket-Key: ")));
    }

    #[tokio::test]
    async fn rejects_other_status() {
        let (mut client, server) = duplex(4096);
        tokio::spawn(serve_once(
            server,
            b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n",
        ));
        let result = perform(&mut client, "lamp.local", 8765, "/").await.unwrap();
        assert!(!result.accepted);
        assert!(result.raw_response.starts_with(b"HTTP/1.1 400"));
    }

    #[tokio::test]
    async fn closed_without_response_is_rejected() {
        let (mut client, server) = duplex(4096);
        tokio::spawn(async move {
            let mut reader = BufReader::new(server);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            drop(reader);
        });
        let result = perform(&mut client, "lamp.local", 8765, "/").await.unwrap();
        assert!(!result.accepted);
    }

    #[tokio::test]
    async fn stops_at_end_of_head() {
        let mut stream = tokio_test::io::Builder::new()
            .read(ACCEPT.as_bytes())
            .read(&[0x81, 0x02, b'h', b'i'])
            .build();
        let head = read_response_head(&mut stream).await.unwrap();
        assert_eq!(head, ACCEPT.as_bytes());

        let frame = crate::socket::decode(&mut stream, 1024).await.unwrap().unwrap();
        assert_eq!(frame.text(), Some("hi"));
    }

    #[tokio::test]
    async fn response_read_is_bounded() {
        let junk = vec![b'x'; RESPONSE_BUFFER_SIZE * 2];
        let mut reader = &junk[..];
        let head = read_response_head(&mut reader).await.unwrap();
        assert_eq!(head.len(), RESPONSE_BUFFER_SIZE);
    }
}
