//! Error types for the prince-driver library.
//!
//! Only failures of the *driver* are errors. A document that the engine could
//! not convert is the normal negative outcome and is reported as `Ok(false)`
//! from the `convert*` methods, with the reasons delivered to the registered
//! [`crate::events::PrinceEvents`] observer while the engine runs.
//!
//! * Configuration errors are raised synchronously by the setters and the
//!   builder, before any process is launched.
//! * Launch, relay and message-read errors are fatal for one invocation and
//!   are never retried.
//!
//! Malformed protocol lines are not errors at all; see [`crate::protocol`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the prince-driver library.
#[derive(Debug, Error)]
pub enum PrinceError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Encryption key size other than 40 or 128 bits.
    #[error("invalid value for key bits: {bits} (must be 40 or 128)")]
    InvalidKeyBits { bits: u32 },

    /// Any other configuration problem (bad config file, bad input type…).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Process errors ────────────────────────────────────────────────────
    /// The engine executable could not be started.
    #[error("Failed to launch Prince engine '{program}': {source}\nCheck the executable path and its permissions.")]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying document or PDF bytes to/from the engine failed.
    ///
    /// Any output already written to the caller's sink is incomplete.
    #[error("I/O error while relaying data {direction}: {source}")]
    RelayFailed {
        direction: RelayDirection,
        #[source]
        source: std::io::Error,
    },

    /// Reading the engine's status stream (stderr) failed.
    #[error("Failed to read messages from the Prince engine: {source}")]
    MessageReadFailed {
        #[source]
        source: std::io::Error,
    },
}

/// Which relay failed in [`PrinceError::RelayFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDirection {
    /// Caller's document source → engine stdin.
    ToEngine,
    /// Engine stdout → caller's PDF sink.
    FromEngine,
}

impl fmt::Display for RelayDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayDirection::ToEngine => f.write_str("to the engine"),
            RelayDirection::FromEngine => f.write_str("from the engine"),
        }
    }
}
