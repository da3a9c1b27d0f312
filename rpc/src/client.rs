//! Minimal async client: one connection per request.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::protocol::{Request, Response};
use crate::ClientError;

/// Send one typed request to the node at `addr` and await its response.
pub async fn send_request<A: ToSocketAddrs>(
    addr: A,
    request: &Request,
) -> Result<Response, ClientError> {
    let raw = serde_json::to_string(request).map_err(ClientError::Encode)?;
    send_raw(addr, &raw).await
}

/// Send raw request text (used for malformed-input tests and the CLI).
pub async fn send_raw<A: ToSocketAddrs>(addr: A, raw: &str) -> Result<Response, ClientError> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(raw.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    serde_json::from_slice(&buf).map_err(ClientError::Decode)
}
