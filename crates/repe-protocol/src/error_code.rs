// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wire-level error taxonomy
//!
//! Error codes travel in the `ec` field of every REPE header. Codes below
//! [`ErrorCode::APPLICATION_BASE`] are reserved for the protocol itself;
//! application-defined codes start at 4096.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated wire error codes with canonical messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No error
    Ok,
    /// Peer speaks a different protocol version
    VersionMismatch,
    /// Header failed framing checks
    InvalidHeader,
    /// Query section could not be interpreted
    InvalidQuery,
    /// Body section could not be interpreted
    InvalidBody,
    /// Request processing raised an error
    ParseError,
    /// No handler registered for the requested method
    MethodNotFound,
    /// Deadline exceeded
    Timeout,
    /// User-defined code (>= 4096)
    Application(u32),
}

impl ErrorCode {
    /// First code available for application-defined errors
    pub const APPLICATION_BASE: u32 = 4096;

    /// Canonical human-readable message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::VersionMismatch => "Version mismatch",
            Self::InvalidHeader => "Invalid header",
            Self::InvalidQuery => "Invalid query",
            Self::InvalidBody => "Invalid body",
            Self::ParseError => "Parse error",
            Self::MethodNotFound => "Method not found",
            Self::Timeout => "Timeout",
            Self::Application(_) => "Application error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::VersionMismatch,
            2 => Self::InvalidHeader,
            3 => Self::InvalidQuery,
            4 => Self::InvalidBody,
            5 => Self::ParseError,
            6 => Self::MethodNotFound,
            7 => Self::Timeout,
            n => Self::Application(n),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Ok => 0,
            ErrorCode::VersionMismatch => 1,
            ErrorCode::InvalidHeader => 2,
            ErrorCode::InvalidQuery => 3,
            ErrorCode::InvalidBody => 4,
            ErrorCode::ParseError => 5,
            ErrorCode::MethodNotFound => 6,
            ErrorCode::Timeout => 7,
            ErrorCode::Application(n) => n,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
