// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Registry served over a live REPE server

use serde_json::{json, Value};
use std::sync::Arc;

use repe_client::{Client, ClientConfig, ClientError};
use repe_protocol::{Body, Message};
use repe_registry::{serve, CallArgs, Registry};
use repe_server::{HandlerResult, Server, ServerConfig};

async fn connect(server: &Server) -> Client {
    let addr = server.local_addr().unwrap();
    let client = Client::new(ClientConfig::new("127.0.0.1", addr.port()));
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn read_write_call_over_tcp() {
    let registry = Arc::new(Registry::new());
    registry.register("/counter", json!(0)).unwrap();
    registry
        .register_fn("/add", |args| match args {
            CallArgs::Named(map) => {
                let a = map.get("a").and_then(Value::as_i64).unwrap_or(0);
                let b = map.get("b").and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(a + b))
            }
            _ => Ok(Value::Null),
        })
        .unwrap();

    let server = Server::new(ServerConfig::new("127.0.0.1", 0));
    serve(&server, Arc::clone(&registry), "");
    server.start().await.unwrap();
    let client = connect(&server).await;

    // GET /counter -> current value
    let result = client.send_request("/counter", &Body::Empty).await.unwrap();
    assert_eq!(result, Body::Value(json!(0)));

    // POST /counter 42 -> set
    client
        .send_request("/counter", &Body::Value(json!(42)))
        .await
        .unwrap();

    // subsequent GET sees the write
    let result = client.send_request("/counter", &Body::Empty).await.unwrap();
    assert_eq!(result, Body::Value(json!(42)));

    // POST /add with named args calls the function
    let result = client
        .send_request("/add", &Body::Value(json!({"a": 10, "b": 20})))
        .await
        .unwrap();
    assert_eq!(result, Body::Value(json!(30)));

    // unknown paths surface as RPC errors
    let err = client
        .send_request("/nowhere", &Body::Empty)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rpc { .. }));

    server.stop();
}

#[tokio::test]
async fn prefix_scopes_the_registry() {
    let registry = Arc::new(Registry::new());
    registry.register("/flag", json!(true)).unwrap();

    let server = Server::new(ServerConfig::new("127.0.0.1", 0));
    serve(&server, Arc::clone(&registry), "/registry");
    server.register("/plain", |_body: Body, _req: Message| async move {
        Ok(HandlerResult::Value(json!("handled")))
    });
    server.start().await.unwrap();
    let client = connect(&server).await;

    // prefixed queries are answered by the registry
    let result = client
        .send_request("/registry/flag", &Body::Empty)
        .await
        .unwrap();
    assert_eq!(result, Body::Value(json!(true)));

    // everything else falls through to handler dispatch
    let result = client.send_request("/plain", &Body::Empty).await.unwrap();
    assert_eq!(result, Body::Value(json!("handled")));

    server.stop();
}
