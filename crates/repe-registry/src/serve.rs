// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serving a registry through a REPE server
//!
//! Installs a middleware that routes requests into
//! [`Registry::handle_request`], optionally stripping a path prefix from
//! the query first. Requests outside the prefix continue to normal handler
//! dispatch.

use async_trait::async_trait;
use std::sync::Arc;

use repe_protocol::{BodyCodec, ErrorCode, Message};
use repe_server::{Middleware, MiddlewareVerdict, Server};

use crate::registry::Registry;

/// Middleware adapter around a shared registry.
pub struct RegistryMiddleware {
    registry: Arc<Registry>,
    prefix: String,
    codec: BodyCodec,
}

impl RegistryMiddleware {
    pub fn new(registry: Arc<Registry>, prefix: impl Into<String>) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
            codec: BodyCodec::new(),
        }
    }

    pub fn with_codec(mut self, codec: BodyCodec) -> Self {
        self.codec = codec;
        self
    }
}

#[async_trait]
impl Middleware for RegistryMiddleware {
    async fn call(&self, request: &Message) -> MiddlewareVerdict {
        let Ok(query) = request.parse_query() else {
            return MiddlewareVerdict::Reject(ErrorCode::InvalidQuery);
        };

        let pointer = if self.prefix.is_empty() {
            query
        } else {
            match query.strip_prefix(&self.prefix) {
                Some(rest) => rest.to_string(),
                // not ours - fall through to handler dispatch
                None => return MiddlewareVerdict::Continue,
            }
        };

        let mut rewritten = request.clone();
        rewritten.query = pointer.into_bytes();
        rewritten.header.query_length = rewritten.query.len() as u64;
        rewritten.header.length = repe_protocol::HEADER_LENGTH as u64
            + rewritten.header.query_length
            + rewritten.header.body_length;

        MiddlewareVerdict::ShortCircuit(self.registry.handle_request(&rewritten, &self.codec))
    }
}

/// Install the registry on a server, rooted under `prefix` (empty prefix
/// claims every request).
pub fn serve(server: &Server, registry: Arc<Registry>, prefix: impl Into<String>) {
    server.add_middleware(RegistryMiddleware::new(registry, prefix));
}
