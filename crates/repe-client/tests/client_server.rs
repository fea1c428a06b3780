// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Client/server integration tests over loopback TCP

use serde_json::{json, Value};
use std::time::Duration;

use repe_client::{await_batch, Client, ClientConfig, ClientError, RequestOptions};
use repe_protocol::{Body, Message};
use repe_server::{HandlerResult, Server, ServerConfig};

async fn start_test_server() -> Server {
    let server = Server::new(ServerConfig::new("127.0.0.1", 0));
    server.register("/add", |body: Body, _req: Message| async move {
        let v = body.as_value().cloned().unwrap_or(json!({}));
        let sum = v["a"].as_i64().unwrap_or(0) + v["b"].as_i64().unwrap_or(0);
        Ok(HandlerResult::Value(json!({ "result": sum })))
    });
    server.register("/slow", |_body: Body, _req: Message| async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok(HandlerResult::Value(json!("eventually")))
    });
    server.register("/echo", |body: Body, _req: Message| async move {
        Ok(HandlerResult::Value(
            body.as_value().cloned().unwrap_or(Value::Null),
        ))
    });
    server.start().await.unwrap();
    server
}

async fn connect_client(server: &Server) -> Client {
    let addr = server.local_addr().unwrap();
    let client = Client::new(ClientConfig::new("127.0.0.1", addr.port()));
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn add_request_roundtrip() {
    let server = start_test_server().await;
    let client = connect_client(&server).await;

    let result = client
        .send_request("/add", &Body::Value(json!({"a": 5, "b": 3})))
        .await
        .unwrap();
    assert_eq!(result, Body::Value(json!({"result": 8})));

    #[derive(serde::Deserialize)]
    struct AddResult {
        result: i64,
    }
    let typed: AddResult = client
        .send_request_as("/add", &Body::Value(json!({"a": 2, "b": 2})))
        .await
        .unwrap();
    assert_eq!(typed.result, 4);

    server.stop();
}

#[tokio::test]
async fn unknown_method_raises_rpc_error() {
    let server = start_test_server().await;
    let client = connect_client(&server).await;

    let err = client
        .send_request("/missing", &Body::Empty)
        .await
        .unwrap_err();
    match &err {
        ClientError::Rpc { code, message } => {
            assert_eq!(*code, 6);
            assert!(message.contains("Method not found"), "got: {}", message);
        }
        other => panic!("expected Rpc error, got {:?}", other),
    }

    server.stop();
}

/// A timed-out request unregisters its slot; the late response is dropped
/// silently and the connection keeps working.
#[tokio::test]
async fn timeout_drops_late_response() {
    let server = start_test_server().await;
    let client = connect_client(&server).await;

    let err = client
        .send_request_with(
            "/slow",
            &Body::Empty,
            RequestOptions {
                timeout: Some(Duration::from_millis(100)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout));
    assert!(client.is_connected());

    // let the late /slow response arrive and be discarded
    tokio::time::sleep(Duration::from_millis(500)).await;

    let result = client
        .send_request("/add", &Body::Value(json!({"a": 1, "b": 2})))
        .await
        .unwrap();
    assert_eq!(result, Body::Value(json!({"result": 3})));

    server.stop();
}

/// Concurrent requests multiplex over one connection and each waiter gets
/// its own response.
#[tokio::test(flavor = "multi_thread")]
async fn batch_requests_correlate_by_id() {
    let server = start_test_server().await;
    let client = connect_client(&server).await;

    let requests: Vec<(String, Body)> = (0..10)
        .map(|i| {
            (
                "/echo".to_string(),
                Body::Value(json!({ "seq": i })),
            )
        })
        .collect();
    let handles = client.batch(requests);
    let results = await_batch(handles).await;

    assert_eq!(results.len(), 10);
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), Body::Value(json!({ "seq": i })));
    }

    server.stop();
}

#[tokio::test]
async fn notify_returns_without_waiting() {
    let server = start_test_server().await;
    let client = connect_client(&server).await;

    client
        .send_notify("/add", &Body::Value(json!({"a": 1, "b": 1})))
        .await
        .unwrap();

    // the connection is still clean for request traffic afterwards
    let result = client
        .send_request("/add", &Body::Value(json!({"a": 3, "b": 4})))
        .await
        .unwrap();
    assert_eq!(result, Body::Value(json!({"result": 7})));

    server.stop();
}

#[tokio::test]
async fn disconnect_fails_new_requests() {
    let server = start_test_server().await;
    let client = connect_client(&server).await;

    client.disconnect().await;
    assert!(!client.is_connected());
    let err = client.send_request("/add", &Body::Empty).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected));

    // reconnect restores service
    client.reconnect().await.unwrap();
    let result = client
        .send_request("/add", &Body::Value(json!({"a": 2, "b": 5})))
        .await
        .unwrap();
    assert_eq!(result, Body::Value(json!({"result": 7})));

    server.stop();
}
