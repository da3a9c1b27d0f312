//! Message framing over a byte stream.
//!
//! A request ends at the first `\n`, at EOF (the peer closed its write
//! half), once the bytes read so far form one complete JSON object or
//! array, or when the size limit is hit. Responses are one JSON object
//! followed by `\n`, after which the writer is shut down.

use serde::de::IgnoredAny;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::Response;

/// Default request size limit.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("request exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("empty request")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one message from `reader`.
pub async fn read_message<R>(reader: &mut R, max_size: usize) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK.min(max_size));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if let Some(pos) = chunk[..n].iter().position(|&b| b == b'\n') {
            buf.extend_from_slice(&chunk[..pos]);
            if buf.len() > max_size {
                return Err(FrameError::TooLarge { limit: max_size });
            }
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > max_size {
            return Err(FrameError::TooLarge { limit: max_size });
        }
        if holds_complete_value(&buf) {
            break;
        }
    }

    if buf.iter().all(u8::is_ascii_whitespace) {
        return Err(FrameError::Empty);
    }
    Ok(buf)
}

/// Whether `buf` is exactly one complete JSON object or array, allowing
/// surrounding whitespace. Scalars are never treated as complete, since a
/// number may still be growing.
fn holds_complete_value(buf: &[u8]) -> bool {
    match buf.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => {}
        _ => return false,
    }
    let mut values = serde_json::Deserializer::from_slice(buf).into_iter::<IgnoredAny>();
    match values.next() {
        Some(Ok(_)) => buf[values.byte_offset()..]
            .iter()
            .all(u8::is_ascii_whitespace),
        _ => false,
    }
}

/// Write `response` as one newline-terminated JSON object and shut down
/// the writer.
pub async fn write_message<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    writer.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_at_newline() {
        let mut input: &[u8] = b"{\"action\":\"get_chain\"}\ntrailing";
        let msg = read_message(&mut input, 1024).await.unwrap();
        assert_eq!(msg, b"{\"action\":\"get_chain\"}");
    }

    #[tokio::test]
    async fn stops_at_eof() {
        let mut input: &[u8] = b"{\"action\":\"get_chain\"}";
        let msg = read_message(&mut input, 1024).await.unwrap();
        assert_eq!(msg, b"{\"action\":\"get_chain\"}");
    }

    #[tokio::test]
    async fn complete_object_ends_message_while_peer_keeps_writing_half_open() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(br#"{"action":"get_balance","user":"doctor"}"#)
            .await
            .unwrap();

        let msg = read_message(&mut server, 1024).await.unwrap();
        assert_eq!(msg, br#"{"action":"get_balance","user":"doctor"}"#);
        drop(client);
    }

    #[tokio::test]
    async fn partial_object_waits_for_the_rest() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let reader = tokio::spawn(async move { read_message(&mut server, 1024).await });

        client.write_all(br#"{"action":"get_"#).await.unwrap();
        tokio::task::yield_now().await;
        client.write_all(br#"chain"}"#).await.unwrap();

        let msg = reader.await.unwrap().unwrap();
        assert_eq!(msg, br#"{"action":"get_chain"}"#);
        drop(client);
    }

    #[test]
    fn completeness_check() {
        assert!(holds_complete_value(br#" {"a":{"b":[1,2]}} "#));
        assert!(!holds_complete_value(br#"{"a":{"b":[1,2]}"#));
        assert!(!holds_complete_value(br#"{"a":"}"#));
        assert!(!holds_complete_value(b"123"));
        assert!(!holds_complete_value(br#"{"a":1} {"#));
    }

    #[tokio::test]
    async fn rejects_oversized_messages() {
        let big = vec![b'x'; 10_000];
        let mut input: &[u8] = &big;
        assert!(matches!(
            read_message(&mut input, 8192).await,
            Err(FrameError::TooLarge { limit: 8192 })
        ));
    }

    #[tokio::test]
    async fn rejects_empty_messages() {
        let mut input: &[u8] = b"";
        assert!(matches!(read_message(&mut input, 1024).await, Err(FrameError::Empty)));
        let mut input: &[u8] = b"  \n";
        assert!(matches!(read_message(&mut input, 1024).await, Err(FrameError::Empty)));
    }

    #[tokio::test]
    async fn writes_newline_terminated_json() {
        let mut out = Vec::new();
        write_message(&mut out, &Response::balance(5)).await.unwrap();
        assert_eq!(out, b"{\"status\":\"success\",\"balance\":5}\n");
    }
}
