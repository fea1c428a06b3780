// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parallel TCP fan-out to named nodes
//!
//! Every node owns one multiplexing client and a tag set. Broadcasts
//! snapshot the node table under its lock, release it, then launch one
//! task per matching node; a request reaches a node only when the node's
//! tag set contains every requested tag.
//!
//! Per-node failures never throw out of a broadcast - they land in the
//! node's [`RemoteResult`].

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use repe_client::{Client, ClientConfig, RequestOptions};
use repe_protocol::Body;

use crate::config::{NodeConfig, RetryPolicy};
use crate::error::{FleetError, Result};

/// Default health-check endpoint
pub const DEFAULT_HEALTH_ENDPOINT: &str = "/status";

/// Deadline for each health-check probe
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

struct Node {
    name: String,
    client: Client,
    tags: HashSet<String>,
    timeout: Duration,
}

/// Per-node outcome of a fleet call.
#[derive(Debug)]
pub struct RemoteResult {
    pub node: String,
    pub value: Option<Body>,
    pub error: Option<FleetError>,
    pub elapsed: Duration,
}

impl RemoteResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// The response body, or the stored error.
    pub fn into_value(self) -> Result<Body> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value.unwrap_or(Body::Empty)),
        }
    }
}

/// Outcome of a parallel connect/reconnect sweep.
#[derive(Debug, Default)]
pub struct ConnectReport {
    pub connected: Vec<String>,
    pub failed: Vec<(String, FleetError)>,
}

/// Per-node health probe outcome.
#[derive(Debug)]
pub struct NodeHealth {
    pub healthy: bool,
    pub latency: Option<Duration>,
    pub error: Option<FleetError>,
}

/// Named collection of REPE clients with tag-filtered parallel broadcast.
pub struct Fleet {
    nodes: Arc<Mutex<HashMap<String, Arc<Node>>>>,
    retry_policy: RetryPolicy,
    default_timeout: Duration,
    health_endpoint: String,
}

impl Fleet {
    /// Materialize clients for the given nodes. Names must be unique;
    /// duplicates are rejected before any client is built.
    pub fn new(configs: Vec<NodeConfig>) -> Result<Self> {
        let mut seen = HashSet::new();
        for node in &configs {
            node.validate().map_err(FleetError::InvalidConfig)?;
            if !seen.insert(node.name.clone()) {
                return Err(FleetError::DuplicateNode(node.name.clone()));
            }
        }

        let mut nodes = HashMap::new();
        for config in configs {
            let client = Client::new(ClientConfig::new(config.host.clone(), config.port));
            nodes.insert(
                config.name.clone(),
                Arc::new(Node {
                    name: config.name,
                    client,
                    tags: config.tags.into_iter().collect(),
                    timeout: config.timeout,
                }),
            );
        }
        info!("[FLEET] Created with {} node(s)", nodes.len());
        Ok(Self {
            nodes: Arc::new(Mutex::new(nodes)),
            retry_policy: RetryPolicy::default(),
            default_timeout: Duration::from_secs(30),
            health_endpoint: DEFAULT_HEALTH_ENDPOINT.to_string(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        if let Err(e) = policy.validate() {
            warn!("[FLEET] Ignoring invalid retry policy: {}", e);
            return self;
        }
        self.retry_policy = policy;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_health_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.health_endpoint = endpoint.into();
        self
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.lock().keys().cloned().collect()
    }

    /// Add a node after construction. The name must still be unique.
    pub fn add_node(&self, config: NodeConfig) -> Result<()> {
        config.validate().map_err(FleetError::InvalidConfig)?;
        let mut nodes = self.nodes.lock();
        if nodes.contains_key(&config.name) {
            return Err(FleetError::DuplicateNode(config.name));
        }
        let client = Client::new(ClientConfig::new(config.host.clone(), config.port));
        nodes.insert(
            config.name.clone(),
            Arc::new(Node {
                name: config.name,
                client,
                tags: config.tags.into_iter().collect(),
                timeout: config.timeout,
            }),
        );
        Ok(())
    }

    /// Remove a node. Its connection closes when the last reference drops.
    pub fn remove_node(&self, name: &str) -> Result<()> {
        self.nodes
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| FleetError::UnknownNode(name.to_string()))
    }

    /// Connect every node in parallel.
    pub async fn connect_all(&self) -> ConnectReport {
        self.sweep(false).await
    }

    /// Disconnect every node in parallel.
    pub async fn disconnect_all(&self) {
        let targets = self.snapshot(&[]);
        let mut handles = Vec::with_capacity(targets.len());
        for node in targets {
            handles.push(tokio::spawn(async move {
                node.client.disconnect().await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Reconnect every node in parallel.
    pub async fn reconnect_all(&self) -> ConnectReport {
        self.sweep(true).await
    }

    async fn sweep(&self, reconnect: bool) -> ConnectReport {
        let targets = self.snapshot(&[]);
        let mut handles = Vec::with_capacity(targets.len());
        for node in targets {
            handles.push(tokio::spawn(async move {
                let outcome = if reconnect {
                    node.client.reconnect().await
                } else {
                    node.client.connect().await
                };
                (node.name.clone(), outcome)
            }));
        }

        let mut report = ConnectReport::default();
        for handle in handles {
            if let Ok((name, outcome)) = handle.await {
                match outcome {
                    Ok(()) => report.connected.push(name),
                    Err(e) => report.failed.push((name, e.into())),
                }
            }
        }
        report
    }

    /// Call one node by name, with retries per the fleet policy.
    pub async fn call(&self, node_name: &str, method: &str, body: &Body) -> RemoteResult {
        let node = self.nodes.lock().get(node_name).cloned();
        match node {
            Some(node) => {
                call_with_retry(
                    node,
                    method.to_string(),
                    body.clone(),
                    self.retry_policy,
                    self.default_timeout,
                )
                .await
            }
            None => RemoteResult {
                node: node_name.to_string(),
                value: None,
                error: Some(FleetError::UnknownNode(node_name.to_string())),
                elapsed: Duration::ZERO,
            },
        }
    }

    /// Broadcast to every node whose tag set contains all of `tags`,
    /// in parallel. Returns one entry per matching node.
    pub async fn broadcast(
        &self,
        method: &str,
        body: &Body,
        tags: &[String],
    ) -> HashMap<String, RemoteResult> {
        let targets = self.snapshot(tags);
        debug!(
            "[FLEET] Broadcasting {} to {} node(s)",
            method,
            targets.len()
        );

        let mut handles = Vec::with_capacity(targets.len());
        for node in targets {
            let method = method.to_string();
            let body = body.clone();
            let policy = self.retry_policy;
            let default_timeout = self.default_timeout;
            handles.push(tokio::spawn(async move {
                call_with_retry(node, method, body, policy, default_timeout).await
            }));
        }

        let mut results = HashMap::new();
        for handle in handles {
            if let Ok(result) = handle.await {
                results.insert(result.node.clone(), result);
            }
        }
        results
    }

    /// Broadcast, then fold the successful values through `f`.
    pub async fn map_reduce<F, R>(&self, method: &str, body: &Body, tags: &[String], f: F) -> R
    where
        F: FnOnce(Vec<Body>) -> R,
    {
        let results = self.broadcast(method, body, tags).await;
        let values = results
            .into_values()
            .filter_map(|result| result.value)
            .collect();
        f(values)
    }

    /// Probe every node against the health endpoint in parallel.
    /// Individual probes never throw; failures land in [`NodeHealth`].
    pub async fn health_check(&self) -> HashMap<String, NodeHealth> {
        let targets = self.snapshot(&[]);
        let endpoint = self.health_endpoint.clone();

        let mut handles = Vec::with_capacity(targets.len());
        for node in targets {
            let endpoint = endpoint.clone();
            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                let outcome = async {
                    node.client.connect().await?;
                    node.client
                        .send_request_with(
                            &endpoint,
                            &Body::Empty,
                            RequestOptions {
                                timeout: Some(HEALTH_CHECK_TIMEOUT),
                                ..Default::default()
                            },
                        )
                        .await
                }
                .await;
                let health = match outcome {
                    Ok(_) => NodeHealth {
                        healthy: true,
                        latency: Some(start.elapsed()),
                        error: None,
                    },
                    Err(e) => NodeHealth {
                        healthy: false,
                        latency: None,
                        error: Some(e.into()),
                    },
                };
                (node.name.clone(), health)
            }));
        }

        let mut results = HashMap::new();
        for handle in handles {
            if let Ok((name, health)) = handle.await {
                results.insert(name, health);
            }
        }
        results
    }

    /// Nodes whose tag set contains every requested tag. Snapshot under
    /// lock; I/O happens after release.
    fn snapshot(&self, tags: &[String]) -> Vec<Arc<Node>> {
        self.nodes
            .lock()
            .values()
            .filter(|node| tags.iter().all(|t| node.tags.contains(t)))
            .cloned()
            .collect()
    }
}

async fn call_with_retry(
    node: Arc<Node>,
    method: String,
    body: Body,
    policy: RetryPolicy,
    default_timeout: Duration,
) -> RemoteResult {
    let start = Instant::now();
    let timeout = if node.timeout > Duration::ZERO {
        node.timeout
    } else {
        default_timeout
    };

    let mut last_error: Option<FleetError> = None;
    for attempt in 1..=policy.max_attempts.max(1) {
        if attempt > 1 {
            tokio::time::sleep(policy.delay).await;
        }
        if let Err(e) = node.client.connect().await {
            last_error = Some(e.into());
            continue;
        }
        match node
            .client
            .send_request_with(
                &method,
                &body,
                RequestOptions {
                    timeout: Some(timeout),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(value) => {
                return RemoteResult {
                    node: node.name.clone(),
                    value: Some(value),
                    error: None,
                    elapsed: start.elapsed(),
                }
            }
            Err(e) => last_error = Some(e.into()),
        }
    }

    RemoteResult {
        node: node.name.clone(),
        value: None,
        error: last_error,
        elapsed: start.elapsed(),
    }
}
