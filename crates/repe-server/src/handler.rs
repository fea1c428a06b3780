// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Handler and middleware contracts
//!
//! A handler may answer with a naked value (framed into a response by the
//! server) or a fully formed response message - an explicit sum, not
//! runtime type dispatch. Middleware runs before dispatch and can let the
//! request continue, short-circuit with a complete response, or reject
//! with a wire error code.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

use repe_protocol::{Body, ErrorCode, Message};

use crate::error::Result;

/// What a handler hands back to the server.
#[derive(Debug, Clone)]
pub enum HandlerResult {
    /// A value the server frames into a JSON response echoing the request
    Value(Value),
    /// A complete response message used as-is
    Raw(Message),
}

impl From<Value> for HandlerResult {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Message> for HandlerResult {
    fn from(message: Message) -> Self {
        Self::Raw(message)
    }
}

/// A function bound to a method path.
///
/// Receives the decoded body and the raw request message. Errors are
/// converted to `PARSE_ERROR` responses carrying the error text.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, body: Body, request: Message) -> Result<HandlerResult>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Body, Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerResult>> + Send,
{
    async fn handle(&self, body: Body, request: Message) -> Result<HandlerResult> {
        (self)(body, request).await
    }
}

/// Outcome of one middleware invocation.
#[derive(Debug, Clone)]
pub enum MiddlewareVerdict {
    /// Proceed to the next middleware / handler dispatch
    Continue,
    /// Stop here and send this response
    ShortCircuit(Message),
    /// Stop here and send an error response with this code
    Reject(ErrorCode),
}

/// Pre-dispatch hook applied to every request in registration order.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, request: &Message) -> MiddlewareVerdict;
}

#[async_trait]
impl<F, Fut> Middleware for F
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = MiddlewareVerdict> + Send,
{
    async fn call(&self, request: &Message) -> MiddlewareVerdict {
        (self)(request.clone()).await
    }
}
