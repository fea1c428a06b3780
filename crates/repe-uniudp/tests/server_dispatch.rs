//! Integration tests for the fire-and-forget UniUDP server

use serde_json::{json, Value};
use std::time::Duration;

use repe_protocol::{Body, BodyFormat, Message};
use repe_uniudp::{UdpNodeConfig, UniUdpClient, UniUdpConfig, UniUdpFleet, UniUdpServer};

fn test_config() -> UniUdpConfig {
    UniUdpConfig::new()
        .with_chunk_size(512)
        .with_inactivity_timeout(Duration::from_millis(200))
        .with_overall_timeout(Duration::from_secs(2))
}

/// A request dispatches to the handler and its result reaches the sink.
#[tokio::test]
async fn request_routes_result_to_sink() {
    let server = UniUdpServer::bind("127.0.0.1:0", test_config()).await.unwrap();
    let addr = server.local_addr().unwrap();

    server.register("/add", |body: Body, _req: Message| async move {
        let v = body.as_value().cloned().unwrap_or(Value::Null);
        let sum = v["a"].as_i64().unwrap_or(0) + v["b"].as_i64().unwrap_or(0);
        Ok(Some(json!({ "result": sum })))
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    server.set_response_sink(move |method: &str, result: &Value, _request: &Message| {
        let _ = tx.send((method.to_string(), result.clone()));
        Ok(())
    });
    server.start().unwrap();

    let client = UniUdpClient::connect(&addr.to_string(), test_config())
        .await
        .unwrap();
    client
        .send_request("/add", &Body::Value(json!({"a": 5, "b": 3})), BodyFormat::Json)
        .await
        .unwrap();

    let (method, result) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("sink should receive a result")
        .unwrap();
    assert_eq!(method, "/add");
    assert_eq!(result, json!({"result": 8}));

    server.stop();
}

/// Notifications run the handler but never touch the sink.
#[tokio::test]
async fn notify_skips_the_sink() {
    let server = UniUdpServer::bind("127.0.0.1:0", test_config()).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (ran_tx, mut ran_rx) = tokio::sync::mpsc::unbounded_channel();
    server.register("/log", move |_body: Body, _req: Message| {
        let ran_tx = ran_tx.clone();
        async move {
            let _ = ran_tx.send(());
            Ok(Some(json!("logged")))
        }
    });

    let (sink_tx, mut sink_rx) = tokio::sync::mpsc::unbounded_channel();
    server.set_response_sink(move |_m: &str, _r: &Value, _q: &Message| {
        let _ = sink_tx.send(());
        Ok(())
    });
    server.start().unwrap();

    let client = UniUdpClient::connect(&addr.to_string(), test_config())
        .await
        .unwrap();
    client
        .send_notify("/log", &Body::from("hello"), BodyFormat::Json)
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), ran_rx.recv())
        .await
        .expect("handler should run")
        .unwrap();
    // give the sink a moment to (incorrectly) fire before asserting silence
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(sink_rx.try_recv().is_err());

    server.stop();
}

/// Fleet broadcast reaches only the nodes matching every requested tag.
#[tokio::test]
async fn fleet_broadcast_with_tags() {
    let server_a = UniUdpServer::bind("127.0.0.1:0", test_config()).await.unwrap();
    let server_b = UniUdpServer::bind("127.0.0.1:0", test_config()).await.unwrap();

    let fleet = UniUdpFleet::new(
        vec![
            UdpNodeConfig::new("a", server_a.local_addr().unwrap().to_string())
                .with_tags(["compute"]),
            UdpNodeConfig::new("b", server_b.local_addr().unwrap().to_string())
                .with_tags(["compute", "primary"]),
        ],
        test_config(),
    )
    .await
    .unwrap();

    let results = fleet
        .broadcast(
            "/task",
            &Body::Value(json!({})),
            BodyFormat::Json,
            &["primary".to_string()],
        )
        .await;
    assert_eq!(results.len(), 1);
    assert!(results["b"].succeeded());
    assert!(results["b"].message_id.is_some());

    let results = fleet
        .broadcast(
            "/task",
            &Body::Value(json!({})),
            BodyFormat::Json,
            &["compute".to_string()],
        )
        .await;
    assert_eq!(results.len(), 2);

    let results = fleet
        .broadcast(
            "/task",
            &Body::Value(json!({})),
            BodyFormat::Json,
            &["none".to_string()],
        )
        .await;
    assert!(results.is_empty());

    let err = UniUdpFleet::new(
        vec![
            UdpNodeConfig::new("dup", "127.0.0.1:1"),
            UdpNodeConfig::new("dup", "127.0.0.1:2"),
        ],
        test_config(),
    )
    .await;
    assert!(err.is_err());
}
