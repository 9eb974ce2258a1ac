use super::cmd;
use super::RespConfig;
use crate::traits::CacheError;
use bytes::BytesMut;
use redis_protocol::resp2::decode::decode_bytes;
use redis_protocol::resp2::types::BytesFrame;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// One client connection to a RESP2 server. Requests are strictly
/// request/reply; no pipelining.
pub struct RespConnection {
    stream: TcpStream,
    buf: BytesMut,
    io_timeout: Duration,
}

impl RespConnection {
    /// Dial the server and run the handshake (AUTH, SELECT) if configured.
    pub async fn connect(config: &RespConfig) -> Result<Self, CacheError> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(&config.address))
            .await
            .map_err(|_| CacheError::Timeout(config.connect_timeout))?
            .map_err(|e| CacheError::Backend(format!("connect to {}: {e}", config.address)))?;
        let _ = stream.set_nodelay(true);

        let mut conn = Self {
            stream,
            buf: BytesMut::with_capacity(4096),
            io_timeout: config.io_timeout,
        };

        if let Some(password) = &config.password {
            cmd::expect_status(conn.request(&cmd::auth(password)).await?)?;
        }
        if config.database != 0 {
            cmd::expect_status(conn.request(&cmd::select(config.database)).await?)?;
        }

        tracing::debug!(addr = %config.address, db = config.database, "RESP connection established");
        Ok(conn)
    }

    /// Send one command and wait for its reply, bounded by the io timeout.
    pub async fn request(&mut self, frame: &BytesFrame) -> Result<BytesFrame, CacheError> {
        let limit = self.io_timeout;
        timeout(limit, self.exchange(frame))
            .await
            .map_err(|_| CacheError::Timeout(limit))?
    }

    async fn exchange(&mut self, frame: &BytesFrame) -> Result<BytesFrame, CacheError> {
        let out = cmd::encode(frame)?;
        self.stream
            .write_all(&out)
            .await
            .map_err(|e| CacheError::Backend(format!("write: {e}")))?;

        loop {
            if !self.buf.is_empty() {
                match decode_bytes(&self.buf.clone().freeze()) {
                    Ok(Some((reply, consumed))) => {
                        let _ = self.buf.split_to(consumed);
                        return Ok(reply);
                    }
                    Ok(None) => {} // Need more data
                    Err(e) => return Err(CacheError::Protocol(e.to_string())),
                }
            }

            let n = self
                .stream
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| CacheError::Backend(format!("read: {e}")))?;
            if n == 0 {
                return Err(CacheError::Backend("connection closed by server".into()));
            }
        }
    }
}
