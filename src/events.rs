//! Observer trait for diagnostics reported by the engine.
//!
//! Register an [`Arc<dyn PrinceEvents>`] with [`crate::Prince::with_events`]
//! to receive every warning and error the engine reports about the document
//! being converted. Messages are delivered synchronously, in the order the
//! engine writes them, while the conversion is still running.
//!
//! Without an observer the engine's messages are read and discarded; only the
//! final success/failure status is kept.
//!
//! # Example
//!
//! ```rust
//! use prince_driver::{Diagnostic, Prince, PrinceEvents};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<String>>);
//!
//! impl PrinceEvents for Collect {
//!     fn on_message(&self, msg: &Diagnostic) {
//!         self.0.lock().unwrap().push(format!("{}: {}", msg.location, msg.text));
//!     }
//! }
//!
//! let prince = Prince::with_events("/usr/bin/prince", Arc::new(Collect::default()));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Receives engine diagnostics as they are decoded.
///
/// Implementations must be `Send + Sync` so a [`crate::Prince`] holding one
/// can be shared between tasks. The callback runs on the task driving the
/// conversion; keep it short or hand the message off.
pub trait PrinceEvents: Send + Sync {
    /// Called once per decoded `msg|` line. Never called for the final status.
    fn on_message(&self, message: &Diagnostic);
}

/// One warning/error/info message about the document being converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Where in the input the problem is, e.g. a file name and line. May be
    /// empty.
    pub location: String,
    /// The message text exactly as sent, including its leading `|`.
    pub text: String,
}

/// The 3-character message type token at the start of a `msg|` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// `err`
    Error,
    /// `wrn`
    Warning,
    /// `inf`
    Info,
    /// `dbg`
    Debug,
    /// Any other token, kept verbatim.
    Other(String),
}

impl Severity {
    pub fn from_token(token: &str) -> Self {
        match token {
            "err" => Severity::Error,
            "wrn" => Severity::Warning,
            "inf" => Severity::Info,
            "dbg" => Severity::Debug,
            other => Severity::Other(other.to_string()),
        }
    }

    /// The raw token as the engine sent it.
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Error => "err",
            Severity::Warning => "wrn",
            Severity::Info => "inf",
            Severity::Debug => "dbg",
            Severity::Other(s) => s,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forwards engine diagnostics to `tracing` under the `prince` target.
pub struct TracingEvents;

impl PrinceEvents for TracingEvents {
    fn on_message(&self, msg: &Diagnostic) {
        let text = msg.text.strip_prefix('|').unwrap_or(&msg.text);
        match msg.severity {
            Severity::Error => error!(target: "prince", location = %msg.location, "{text}"),
            Severity::Warning => warn!(target: "prince", location = %msg.location, "{text}"),
            Severity::Info => info!(target: "prince", location = %msg.location, "{text}"),
            Severity::Debug | Severity::Other(_) => debug!(
                target: "prince",
                severity = %msg.severity,
                location = %msg.location,
                "{text}"
            ),
        }
    }
}

/// Channel delivery: each diagnostic is sent to the receiver in order.
/// Messages are dropped once the receiver is gone.
impl PrinceEvents for mpsc::UnboundedSender<Diagnostic> {
    fn on_message(&self, msg: &Diagnostic) {
        let _ = self.send(msg.clone());
    }
}

/// Convenience alias matching the type stored in [`crate::Prince`].
pub type EventsHandle = Arc<dyn PrinceEvents>;
