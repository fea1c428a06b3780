// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The registry tree: named entries addressed by JSON Pointer
//!
//! Each entry is a leaf value, a callable, or a nested mapping. Values may
//! themselves be structured JSON; pointer resolution descends entry maps
//! first and continues inside JSON objects and arrays.
//!
//! Operation selection follows the body of the incoming request: empty
//! body reads, a body aimed at a callable calls it, any other body writes.

use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use repe_protocol::{Body, BodyCodec, BodyFormat, Message};

use crate::error::{RegistryError, Result};
use crate::pointer::{parse_index, parse_pointer};

/// Arguments handed to a callable entry.
#[derive(Debug, Clone)]
pub enum CallArgs {
    /// Empty mapping body
    None,
    /// Sequence body
    Positional(Vec<Value>),
    /// Mapping body
    Named(Map<String, Value>),
}

/// A function living in the registry tree.
pub trait Callable: Send + Sync {
    fn call(&self, args: CallArgs) -> Result<Value>;
}

impl<F> Callable for F
where
    F: Fn(CallArgs) -> Result<Value> + Send + Sync,
{
    fn call(&self, args: CallArgs) -> Result<Value> {
        (self)(args)
    }
}

/// One node of the registry tree.
#[derive(Clone)]
pub enum Entry {
    /// Leaf value (may be structured JSON)
    Value(Value),
    /// Callable leaf
    Callable(Arc<dyn Callable>),
    /// Nested mapping
    Map(HashMap<String, Entry>),
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl Entry {
    fn describe(&self, path: &str) -> Value {
        match self {
            Entry::Value(v) => v.clone(),
            Entry::Callable(_) => json!({ "type": "function", "path": path }),
            Entry::Map(map) => {
                let mut out = Map::new();
                for (key, entry) in map {
                    out.insert(key.clone(), entry.describe(&format!("{}/{}", path, key)));
                }
                Value::Object(out)
            }
        }
    }
}

/// Hierarchical name tree accessed by JSON Pointer.
#[derive(Default)]
pub struct Registry {
    root: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an entry, creating intermediate mappings for non-terminal
    /// segments. The empty path is refused.
    pub fn register(&self, pointer: &str, entry: impl Into<Entry>) -> Result<()> {
        let segments = parse_pointer(pointer)?;
        let Some((last, init)) = segments.split_last() else {
            return Err(RegistryError::EmptyPath);
        };

        let mut root = self.root.write();
        let mut current = &mut *root;
        for segment in init {
            let next = current
                .entry(segment.clone())
                .or_insert_with(|| Entry::Map(HashMap::new()));
            match next {
                Entry::Map(map) => current = map,
                _ => return Err(RegistryError::NotTraversable(segment.clone())),
            }
        }
        current.insert(last.clone(), entry.into());
        Ok(())
    }

    /// Install a callable at the path.
    pub fn register_fn<F>(&self, pointer: &str, f: F) -> Result<()>
    where
        F: Fn(CallArgs) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(pointer, Entry::Callable(Arc::new(f)))
    }

    /// Overlay keys onto the root mapping.
    pub fn merge(&self, object: Map<String, Value>) -> Result<()> {
        self.merge_at("", object)
    }

    /// Walk to (creating when absent) the mapping at `pointer` and overlay
    /// the object's keys onto it.
    pub fn merge_at(&self, pointer: &str, object: Map<String, Value>) -> Result<()> {
        let segments = parse_pointer(pointer)?;
        let mut root = self.root.write();
        let mut current = &mut *root;
        for segment in &segments {
            let next = current
                .entry(segment.clone())
                .or_insert_with(|| Entry::Map(HashMap::new()));
            match next {
                Entry::Map(map) => current = map,
                _ => return Err(RegistryError::NotTraversable(segment.clone())),
            }
        }
        for (key, value) in object {
            current.insert(key, Entry::Value(value));
        }
        Ok(())
    }

    /// Read the value at the pointer. Callables read as a descriptor
    /// `{"type": "function", "path": ...}`.
    pub fn read(&self, pointer: &str) -> Result<Value> {
        let segments = parse_pointer(pointer)?;
        let root = self.root.read();

        if segments.is_empty() {
            let mut out = Map::new();
            for (key, entry) in root.iter() {
                out.insert(key.clone(), entry.describe(&format!("/{}", key)));
            }
            return Ok(Value::Object(out));
        }

        let (entry, rest) = descend_entries(&root, &segments)?;
        match entry {
            Entry::Callable(_) if rest.is_empty() => {
                Ok(json!({ "type": "function", "path": pointer }))
            }
            Entry::Callable(_) => Err(RegistryError::NotTraversable(rest[0].clone())),
            Entry::Map(_) if rest.is_empty() => Ok(entry.describe(pointer)),
            Entry::Map(_) => Err(RegistryError::NotFound(pointer.to_string())),
            Entry::Value(value) => resolve_value(value, rest).cloned(),
        }
    }

    /// The callable at the pointer, when the target is one.
    pub fn callable_at(&self, pointer: &str) -> Result<Option<Arc<dyn Callable>>> {
        let segments = parse_pointer(pointer)?;
        if segments.is_empty() {
            return Ok(None);
        }
        let root = self.root.read();
        match descend_entries(&root, &segments) {
            Ok((Entry::Callable(f), rest)) if rest.is_empty() => Ok(Some(Arc::clone(f))),
            _ => Ok(None),
        }
    }

    /// Replace the value at the pointer. Writing at the root requires an
    /// object and is applied as a merge.
    pub fn write(&self, pointer: &str, value: Value) -> Result<()> {
        let segments = parse_pointer(pointer)?;

        if segments.is_empty() {
            let Value::Object(object) = value else {
                return Err(RegistryError::RootWriteRequiresObject);
            };
            let mut root = self.root.write();
            for (key, v) in object {
                root.insert(key, Entry::Value(v));
            }
            return Ok(());
        }

        let mut root = self.root.write();

        // navigate entry maps as far as they go; the remainder of the path
        // continues inside a JSON value
        let mut current: &mut HashMap<String, Entry> = &mut root;
        let mut depth = 0;
        loop {
            let segment = &segments[depth];
            if depth + 1 == segments.len() {
                // final segment: key write into the mapping
                if matches!(current.get(segment), Some(Entry::Callable(_))) {
                    return Err(RegistryError::NotTraversable(segment.clone()));
                }
                current.insert(segment.clone(), Entry::Value(value));
                return Ok(());
            }
            let entry = current
                .get_mut(segment)
                .ok_or_else(|| RegistryError::NotFound(segment.clone()))?;
            match entry {
                Entry::Map(map) => {
                    current = map;
                    depth += 1;
                }
                Entry::Value(existing) => {
                    let tail = &segments[depth + 1..];
                    let Some((last, init)) = tail.split_last() else {
                        return Err(RegistryError::EmptyPath);
                    };
                    let parent = resolve_value_mut(existing, init)?;
                    return write_value_segment(parent, last, value);
                }
                Entry::Callable(_) => {
                    return Err(RegistryError::NotTraversable(segment.clone()))
                }
            }
        }
    }

    /// Route one REPE request through the registry: empty body reads, a
    /// body aimed at a callable calls, any other body writes.
    pub fn handle_request(&self, request: &Message, codec: &BodyCodec) -> Message {
        let id = request.header.id;
        let query = request.query.clone();

        let pointer = match request.parse_query() {
            Ok(pointer) => pointer,
            Err(e) => {
                return Message::error_response_with(
                    id,
                    query,
                    repe_protocol::ErrorCode::InvalidQuery,
                    &e.to_string(),
                )
            }
        };

        match self.dispatch(&pointer, request, codec) {
            Ok(value) => match serde_json::to_vec(&value) {
                Ok(bytes) => Message::response(id, query, bytes, BodyFormat::Json),
                Err(e) => Message::error_response_with(
                    id,
                    query,
                    repe_protocol::ErrorCode::ParseError,
                    &e.to_string(),
                ),
            },
            Err(e) => {
                debug!("[REGISTRY] {} failed: {}", pointer, e);
                Message::error_response_with(id, query, e.wire_code(), &e.to_string())
            }
        }
    }

    fn dispatch(&self, pointer: &str, request: &Message, codec: &BodyCodec) -> Result<Value> {
        if request.body.is_empty() {
            return self.read(pointer);
        }

        let body = codec.decode(&request.body, request.header.body_format)?;
        let value = match body {
            Body::Value(value) => value,
            Body::Text(text) => Value::String(text),
            Body::Empty => return self.read(pointer),
            Body::Bytes(_) => {
                return Err(RegistryError::InvalidBody(
                    "registry operations need a structured body".to_string(),
                ))
            }
        };

        if let Some(callable) = self.callable_at(pointer)? {
            let args = match value {
                Value::Object(map) if map.is_empty() => CallArgs::None,
                Value::Object(map) => CallArgs::Named(map),
                Value::Array(items) => CallArgs::Positional(items),
                other => CallArgs::Positional(vec![other]),
            };
            return callable.call(args);
        }

        self.write(pointer, value)?;
        Ok(Value::Null)
    }
}

/// Descend entry maps as far as the path allows; returns the deepest entry
/// reached and the unconsumed segments (which continue inside a value).
fn descend_entries<'a>(
    root: &'a HashMap<String, Entry>,
    segments: &'a [String],
) -> Result<(&'a Entry, &'a [String])> {
    let mut current = root;
    for (depth, segment) in segments.iter().enumerate() {
        let entry = current
            .get(segment)
            .ok_or_else(|| RegistryError::NotFound(segment.clone()))?;
        match entry {
            Entry::Map(map) if depth + 1 < segments.len() => current = map,
            _ => return Ok((entry, &segments[depth + 1..])),
        }
    }
    // segments is non-empty, so the loop always returns
    Err(RegistryError::EmptyPath)
}

/// Resolve the remaining segments inside a JSON value.
fn resolve_value<'a>(value: &'a Value, segments: &[String]) -> Result<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| RegistryError::NotFound(segment.clone()))?,
            Value::Array(items) => &items[parse_index(segment, items.len())?],
            _ => return Err(RegistryError::NotTraversable(segment.clone())),
        };
    }
    Ok(current)
}

fn resolve_value_mut<'a>(value: &'a mut Value, segments: &[String]) -> Result<&'a mut Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map
                .get_mut(segment)
                .ok_or_else(|| RegistryError::NotFound(segment.clone()))?,
            Value::Array(items) => {
                let index = parse_index(segment, items.len())?;
                &mut items[index]
            }
            _ => return Err(RegistryError::NotTraversable(segment.clone())),
        };
    }
    Ok(current)
}

fn write_value_segment(target: &mut Value, segment: &str, value: Value) -> Result<()> {
    match target {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(segment, items.len())?;
            items[index] = value;
            Ok(())
        }
        _ => Err(RegistryError::NotTraversable(segment.to_string())),
    }
}
