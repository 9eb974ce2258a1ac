use crate::traits::CacheError;
use bytes::{Bytes, BytesMut};
use redis_protocol::resp2::encode::extend_encode;
use redis_protocol::resp2::types::BytesFrame;
use std::time::Duration;

/// Build a RESP2 command: an Array of bulk strings.
fn command(parts: Vec<Bytes>) -> BytesFrame {
    BytesFrame::Array(parts.into_iter().map(BytesFrame::BulkString).collect())
}

fn arg(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

pub fn ping() -> BytesFrame {
    command(vec![Bytes::from_static(b"PING")])
}

pub fn auth(password: &str) -> BytesFrame {
    command(vec![Bytes::from_static(b"AUTH"), arg(password)])
}

pub fn select(database: u32) -> BytesFrame {
    command(vec![Bytes::from_static(b"SELECT"), arg(&database.to_string())])
}

pub fn get(key: &str) -> BytesFrame {
    command(vec![Bytes::from_static(b"GET"), arg(key)])
}

/// SET key value PX millis. Sub-millisecond ttls round up to 1ms since the
/// server rejects a zero expire time.
pub fn set_px(key: &str, value: Bytes, ttl: Duration) -> BytesFrame {
    let millis = ttl.as_millis().max(1);
    command(vec![
        Bytes::from_static(b"SET"),
        arg(key),
        value,
        Bytes::from_static(b"PX"),
        arg(&millis.to_string()),
    ])
}

pub fn exists(key: &str) -> BytesFrame {
    command(vec![Bytes::from_static(b"EXISTS"), arg(key)])
}

pub fn del(key: &str) -> BytesFrame {
    command(vec![Bytes::from_static(b"DEL"), arg(key)])
}

pub fn flushdb() -> BytesFrame {
    command(vec![Bytes::from_static(b"FLUSHDB")])
}

/// Serialize a frame onto the wire. `extend_encode` grows the buffer as needed;
/// integers stay integers (standard RESP2).
pub fn encode(frame: &BytesFrame) -> Result<BytesMut, CacheError> {
    let mut out = BytesMut::new();
    extend_encode(&mut out, frame, false).map_err(|e| CacheError::Protocol(e.to_string()))?;
    Ok(out)
}

/// Error replies become backend errors; everything else passes through.
pub fn check_reply(frame: BytesFrame) -> Result<BytesFrame, CacheError> {
    match frame {
        BytesFrame::Error(msg) => Err(CacheError::Backend(msg.to_string())),
        other => Ok(other),
    }
}

/// Expect a `+OK` (or `+PONG`) status reply.
pub fn expect_status(frame: BytesFrame) -> Result<(), CacheError> {
    match check_reply(frame)? {
        BytesFrame::SimpleString(_) => Ok(()),
        other => Err(unexpected("status", &other)),
    }
}

pub fn expect_integer(frame: BytesFrame) -> Result<i64, CacheError> {
    match check_reply(frame)? {
        BytesFrame::Integer(n) => Ok(n),
        other => Err(unexpected("integer", &other)),
    }
}

/// A bulk string is a value, a null reply is "key not found".
pub fn expect_bulk_or_null(frame: BytesFrame) -> Result<Option<Bytes>, CacheError> {
    match check_reply(frame)? {
        BytesFrame::BulkString(b) => Ok(Some(b)),
        BytesFrame::Null => Ok(None),
        other => Err(unexpected("bulk string", &other)),
    }
}

fn unexpected(wanted: &str, got: &BytesFrame) -> CacheError {
    CacheError::Protocol(format!("expected {wanted} reply, got {got:?}"))
}
