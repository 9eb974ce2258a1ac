#![allow(dead_code)]

//! A small in-process RESP2 server: PING, AUTH, SELECT, GET, SET (with PX),
//! EXISTS, DEL and FLUSHDB over a shared map.

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use redis_protocol::resp2::decode::decode_bytes;
use redis_protocol::resp2::encode::extend_encode;
use redis_protocol::resp2::types::BytesFrame;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub type Store = Arc<Mutex<HashMap<String, (Bytes, Option<Instant>)>>>;

fn bulk_to_string(frame: &BytesFrame) -> String {
    match frame {
        BytesFrame::BulkString(b) => String::from_utf8_lossy(b).into_owned(),
        _ => String::new(),
    }
}

fn live(store: &Store, key: &str) -> Option<Bytes> {
    let mut map = store.lock();
    match map.get(key) {
        Some((_, Some(exp))) if Instant::now() >= *exp => {
            map.remove(key);
            None
        }
        Some((v, _)) => Some(v.clone()),
        None => None,
    }
}

fn dispatch(frame: &BytesFrame, store: &Store) -> BytesFrame {
    let args = match frame {
        BytesFrame::Array(arr) if !arr.is_empty() => arr,
        _ => return BytesFrame::Error("ERR expected array".into()),
    };
    let cmd = bulk_to_string(&args[0]).to_uppercase();

    match cmd.as_str() {
        "PING" => BytesFrame::SimpleString("PONG".into()),
        "SELECT" | "AUTH" => BytesFrame::SimpleString("OK".into()),
        "GET" => match live(store, &bulk_to_string(&args[1])) {
            Some(v) => BytesFrame::BulkString(v),
            None => BytesFrame::Null,
        },
        "SET" => {
            let key = bulk_to_string(&args[1]);
            let value = match &args[2] {
                BytesFrame::BulkString(b) => b.clone(),
                _ => Bytes::new(),
            };
            let mut expires = None;
            if args.len() >= 5 && bulk_to_string(&args[3]).eq_ignore_ascii_case("PX") {
                match bulk_to_string(&args[4]).parse::<u64>() {
                    Ok(ms) if ms > 0 => {
                        expires = Some(Instant::now() + Duration::from_millis(ms));
                    }
                    _ => return BytesFrame::Error("ERR invalid expire time in 'set' command".into()),
                }
            }
            store.lock().insert(key, (value, expires));
            BytesFrame::SimpleString("OK".into())
        }
        "EXISTS" => {
            let found = live(store, &bulk_to_string(&args[1])).is_some();
            BytesFrame::Integer(found as i64)
        }
        "DEL" => {
            let removed = store.lock().remove(&bulk_to_string(&args[1])).is_some();
            BytesFrame::Integer(removed as i64)
        }
        "FLUSHDB" => {
            store.lock().clear();
            BytesFrame::SimpleString("OK".into())
        }
        _ => BytesFrame::Error("ERR unknown command".into()),
    }
}

/// Serves commands until the client hangs up, or closes the connection
/// itself after `limit` replies.
async fn handle_connection(mut stream: TcpStream, store: Store, limit: Option<usize>) {
    let mut buf = BytesMut::with_capacity(4096);
    let mut served = 0;
    loop {
        match stream.read_buf(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        while let Ok(Some((frame, consumed))) = decode_bytes(&buf.clone().freeze()) {
            let _ = buf.split_to(consumed);
            let reply = dispatch(&frame, &store);
            let mut out = BytesMut::new();
            if extend_encode(&mut out, &reply, false).is_err() {
                return;
            }
            if stream.write_all(&out).await.is_err() {
                return;
            }
            served += 1;
            if limit.is_some_and(|max| served >= max) {
                return;
            }
        }
    }
}

pub async fn spawn_server() -> (String, Store) {
    spawn_server_with(None).await
}

pub async fn spawn_server_with(limit: Option<usize>) -> (String, Store) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let store: Store = Arc::new(Mutex::new(HashMap::new()));
    let server_store = Arc::clone(&store);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(handle_connection(stream, Arc::clone(&server_store), limit));
        }
    });
    (addr, store)
}
