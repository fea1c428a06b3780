// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parallel UniUDP fan-out to named nodes
//!
//! A successful [`SendResult`] means the send syscalls returned, not that
//! anything was delivered - this transport is one-way.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use repe_protocol::{Body, BodyFormat};

use crate::client::UniUdpClient;
use crate::config::UniUdpConfig;
use crate::error::{Result, UniUdpError};

/// Declarative node description for fleet construction.
#[derive(Debug, Clone)]
pub struct UdpNodeConfig {
    pub name: String,
    pub address: String,
    pub tags: Vec<String>,
}

impl UdpNodeConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

struct UdpNode {
    client: Arc<UniUdpClient>,
    tags: HashSet<String>,
}

/// Per-node outcome of a fleet send.
#[derive(Debug)]
pub struct SendResult {
    pub node: String,
    /// REPE message id when the send returned
    pub message_id: Option<u64>,
    pub error: Option<UniUdpError>,
    pub elapsed: Duration,
}

impl SendResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Named collection of UniUDP clients with tag-filtered parallel send.
pub struct UniUdpFleet {
    nodes: Mutex<HashMap<String, UdpNode>>,
}

impl UniUdpFleet {
    /// Materialize clients for the given nodes. Names must be unique.
    pub async fn new(configs: Vec<UdpNodeConfig>, config: UniUdpConfig) -> Result<Self> {
        let mut seen = HashSet::new();
        for node in &configs {
            if !seen.insert(node.name.clone()) {
                return Err(UniUdpError::InvalidArgument(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }

        let mut nodes = HashMap::new();
        for node in configs {
            let client = Arc::new(UniUdpClient::connect(&node.address, config.clone()).await?);
            nodes.insert(
                node.name,
                UdpNode {
                    client,
                    tags: node.tags.into_iter().collect(),
                },
            );
        }
        Ok(Self {
            nodes: Mutex::new(nodes),
        })
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.lock().keys().cloned().collect()
    }

    /// Nodes whose tag set contains every requested tag. Snapshot under
    /// lock; I/O happens after release.
    fn snapshot(&self, tags: &[String]) -> Vec<(String, Arc<UniUdpClient>)> {
        self.nodes
            .lock()
            .iter()
            .filter(|(_, node)| tags.iter().all(|t| node.tags.contains(t)))
            .map(|(name, node)| (name.clone(), Arc::clone(&node.client)))
            .collect()
    }

    /// Send a request frame to every matching node in parallel.
    pub async fn broadcast(
        &self,
        method: &str,
        body: &Body,
        format: BodyFormat,
        tags: &[String],
    ) -> HashMap<String, SendResult> {
        self.broadcast_inner(method, body, format, tags, false).await
    }

    /// Send a notification frame to every matching node in parallel.
    pub async fn broadcast_notify(
        &self,
        method: &str,
        body: &Body,
        format: BodyFormat,
        tags: &[String],
    ) -> HashMap<String, SendResult> {
        self.broadcast_inner(method, body, format, tags, true).await
    }

    async fn broadcast_inner(
        &self,
        method: &str,
        body: &Body,
        format: BodyFormat,
        tags: &[String],
        notify: bool,
    ) -> HashMap<String, SendResult> {
        let targets = self.snapshot(tags);
        debug!(
            "[UNIUDP-FLEET] Broadcasting {} to {} node(s)",
            method,
            targets.len()
        );

        let mut handles = Vec::with_capacity(targets.len());
        for (name, client) in targets {
            let method = method.to_string();
            let body = body.clone();
            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                let outcome = if notify {
                    client.send_notify(&method, &body, format).await
                } else {
                    client.send_request(&method, &body, format).await
                };
                match outcome {
                    Ok(id) => SendResult {
                        node: name,
                        message_id: Some(id),
                        error: None,
                        elapsed: start.elapsed(),
                    },
                    Err(e) => SendResult {
                        node: name,
                        message_id: None,
                        error: Some(e),
                        elapsed: start.elapsed(),
                    },
                }
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
}
