//! Error types for qprobe-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
///
/// Every failure surfaces immediately to the caller; there is no internal
/// retry or backoff anywhere in this crate. The transfer layer does not
/// distinguish "device absent" from "device present but malfunctioning" -
/// both show up as [`Error::TransferFailed`] or as implausible decoded
/// bytes, which callers interpret as a data-quality signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No QSPI controller matched the requested selector
    DeviceNotFound,
    /// Controller was found but failed to initialize or self-test
    ControllerInit,
    /// Bus exchange failed (opaque cause)
    TransferFailed,
    /// Caller-supplied buffer or length violates a framing or decoding
    /// precondition - unreachable from correct callers
    ContractViolation,
    /// Controller cannot honor a requested option bit
    UnsupportedOption,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => write!(f, "QSPI controller not found"),
            Self::ControllerInit => write!(f, "QSPI controller initialization failed"),
            Self::TransferFailed => write!(f, "bus exchange failed"),
            Self::ContractViolation => write!(f, "buffer or length precondition violated"),
            Self::UnsupportedOption => write!(f, "controller option not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
