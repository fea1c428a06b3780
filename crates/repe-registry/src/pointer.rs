//! JSON Pointer parsing per RFC 6901
//!
//! The empty string and `"/"` both address the root (empty segment list).
//! Every other pointer must start with `/`; segments are split on `/` and
//! unescaped `~1` -> `/` before `~0` -> `~`.

use crate::error::{RegistryError, Result};

/// Split a pointer into unescaped segments.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() || pointer == "/" {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(RegistryError::InvalidPointer(pointer.to_string()));
    };
    Ok(rest.split('/').map(unescape).collect())
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Parse a segment as a zero-based sequence index.
pub fn parse_index(segment: &str, len: usize) -> Result<usize> {
    let index: usize = segment
        .parse()
        .map_err(|_| RegistryError::NotFound(format!("'{}' is not a sequence index", segment)))?;
    if index >= len {
        return Err(RegistryError::NotFound(format!(
            "index {} out of range (len {})",
            index, len
        )));
    }
    Ok(index)
}
