//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `BrokerError`, so functions can simply return `Result<T>`.
use crate::error::BrokerError;

/// Workspace-wide `Result` alias with `BrokerError` as the default error.
pub type Result<T, E = BrokerError> = std::result::Result<T, E>;
