// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests driving the server with raw TCP frames

use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use repe_protocol::{Body, BodyFormat, ErrorCode, Header, Message, HEADER_LENGTH};
use repe_server::{HandlerResult, Middleware, MiddlewareVerdict, Server, ServerConfig};

async fn start_add_server() -> Server {
    let server = Server::new(ServerConfig::new("127.0.0.1", 0));
    server.register("/add", |body: Body, _req: Message| async move {
        let v = body.as_value().cloned().unwrap_or(json!({}));
        let sum = v["a"].as_i64().unwrap_or(0) + v["b"].as_i64().unwrap_or(0);
        Ok(HandlerResult::Value(json!({ "result": sum })))
    });
    server.start().await.unwrap();
    server
}

/// Write one frame and read back exactly one response frame.
async fn roundtrip(stream: &mut TcpStream, request: &Message) -> Message {
    stream.write_all(&request.to_bytes()).await.unwrap();
    read_response(stream).await
}

async fn read_response(stream: &mut TcpStream) -> Message {
    let mut header_buf = [0u8; HEADER_LENGTH];
    stream.read_exact(&mut header_buf).await.unwrap();
    let header = Header::from_bytes(&header_buf).unwrap();
    let mut payload = vec![0u8; (header.query_length + header.body_length) as usize];
    stream.read_exact(&mut payload).await.unwrap();
    let mut frame = header_buf.to_vec();
    frame.extend_from_slice(&payload);
    Message::from_bytes(&frame).unwrap()
}

#[tokio::test]
async fn add_request_roundtrip() {
    let server = start_add_server().await;
    let addr = server.local_addr().unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = Message::request(7, "/add", b"{\"a\":5,\"b\":3}".to_vec(), BodyFormat::Json);
    let response = roundtrip(&mut stream, &request).await;

    assert_eq!(response.header.ec, ErrorCode::Ok);
    assert_eq!(response.header.id, 7);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body, json!({"result": 8}));

    server.stop();
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let server = start_add_server().await;
    let addr = server.local_addr().unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = Message::request(1, "/missing", Vec::new(), BodyFormat::Json);
    let response = roundtrip(&mut stream, &request).await;

    assert_eq!(response.header.ec, ErrorCode::MethodNotFound);
    assert_eq!(response.body, b"Method not found");

    server.stop();
}

#[tokio::test]
async fn notify_writes_no_response_and_keeps_connection() {
    let server = start_add_server().await;
    let addr = server.local_addr().unwrap();

    let (ran_tx, mut ran_rx) = tokio::sync::mpsc::unbounded_channel();
    server.register("/log", move |_body: Body, _req: Message| {
        let ran_tx = ran_tx.clone();
        async move {
            let _ = ran_tx.send(());
            Ok(HandlerResult::Value(json!(null)))
        }
    });

    let mut stream = TcpStream::connect(addr).await.unwrap();

    let notify = Message::notify(1, "/log", Vec::new(), BodyFormat::Json);
    stream.write_all(&notify.to_bytes()).await.unwrap();

    // handler ran
    tokio::time::timeout(Duration::from_secs(2), ran_rx.recv())
        .await
        .expect("handler should run")
        .unwrap();

    // connection still serves the next request; the first frame we read is
    // the /add response, proving nothing was written for the notify
    let request = Message::request(2, "/add", b"{\"a\":1,\"b\":1}".to_vec(), BodyFormat::Json);
    let response = roundtrip(&mut stream, &request).await;
    assert_eq!(response.header.id, 2);
    assert_eq!(response.header.ec, ErrorCode::Ok);

    server.stop();
}

#[tokio::test]
async fn malformed_header_is_rejected() {
    let server = start_add_server().await;
    let addr = server.local_addr().unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut garbage = Header::default().to_bytes();
    garbage[8] = 0xFF; // corrupt the magic
    stream.write_all(&garbage).await.unwrap();

    let response = read_response(&mut stream).await;
    assert_eq!(response.header.ec, ErrorCode::InvalidHeader);

    server.stop();
}

/// A wire-valid header declaring a payload beyond the cap is rejected
/// without the server ever trying to read (or allocate) the payload.
#[tokio::test]
async fn oversized_frame_is_rejected() {
    let server = Server::new(
        ServerConfig::new("127.0.0.1", 0).with_max_message_size(1024),
    );
    server.start().await.unwrap();
    let mut stream = TcpStream::connect(server.local_addr().unwrap()).await.unwrap();

    let header = Header::new(9, 2, 4 * 1024 * 1024);
    stream.write_all(&header.to_bytes()).await.unwrap();

    let response = read_response(&mut stream).await;
    assert_eq!(response.header.id, 9);
    assert_eq!(response.header.ec, ErrorCode::InvalidHeader);

    server.stop();
}

#[tokio::test]
async fn handler_error_becomes_parse_error_response() {
    let server = Server::new(ServerConfig::new("127.0.0.1", 0));
    server.register("/fail", |_body: Body, _req: Message| async move {
        Err(repe_server::ServerError::Handler("division by zero".to_string()))
    });
    server.start().await.unwrap();
    let mut stream = TcpStream::connect(server.local_addr().unwrap()).await.unwrap();

    let request = Message::request(3, "/fail", Vec::new(), BodyFormat::Json);
    let response = roundtrip(&mut stream, &request).await;

    assert_eq!(response.header.ec, ErrorCode::ParseError);
    assert_eq!(response.header.body_format, BodyFormat::Utf8);
    assert_eq!(response.body, b"division by zero");

    server.stop();
}

struct DenyAll;

#[async_trait::async_trait]
impl Middleware for DenyAll {
    async fn call(&self, _request: &Message) -> MiddlewareVerdict {
        MiddlewareVerdict::Reject(ErrorCode::Application(4100))
    }
}

#[tokio::test]
async fn middleware_can_reject_and_short_circuit() {
    let server = start_add_server().await;
    server.add_middleware(|request: Message| async move {
        if request.parse_query().map(|m| m == "/canned").unwrap_or(false) {
            return MiddlewareVerdict::ShortCircuit(Message::response(
                request.header.id,
                request.query.clone(),
                b"\"from middleware\"".to_vec(),
                BodyFormat::Json,
            ));
        }
        MiddlewareVerdict::Continue
    });

    let addr = server.local_addr().unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // short-circuited path never reaches handler dispatch
    let response = roundtrip(
        &mut stream,
        &Message::request(5, "/canned", Vec::new(), BodyFormat::Json),
    )
    .await;
    assert_eq!(response.header.ec, ErrorCode::Ok);
    assert_eq!(response.body, b"\"from middleware\"");

    // untouched path still dispatches
    let response = roundtrip(
        &mut stream,
        &Message::request(6, "/add", b"{\"a\":2,\"b\":2}".to_vec(), BodyFormat::Json),
    )
    .await;
    assert_eq!(response.header.ec, ErrorCode::Ok);

    // a rejecting middleware turns into an error response
    server.add_middleware(DenyAll);
    let response = roundtrip(
        &mut stream,
        &Message::request(8, "/add", b"{}".to_vec(), BodyFormat::Json),
    )
    .await;
    assert_eq!(response.header.ec, ErrorCode::Application(4100));

    server.stop();
}
