//! # prince-driver
//!
//! Drive the [Prince](https://www.princexml.com/) HTML/XML-to-PDF engine as a
//! subprocess.
//!
//! The engine does all the rendering. This crate builds its command line
//! from a typed [`PrinceConfig`], runs it in `--server` mode, relays document
//! and PDF bytes over stdin/stdout when asked to, and decodes the status
//! protocol the engine writes on stderr into a success flag plus
//! [`Diagnostic`]s for an optional [`PrinceEvents`] observer.
//!
//! ## Invocation Overview
//!
//! ```text
//! PrinceConfig
//!  │
//!  ├─ 1. Build    ordered argument vector (+ --server and mode flags)
//!  ├─ 2. Launch   tokio::process child, stderr always piped
//!  ├─ 3. Relay    document ──▶ stdin, stdout ──▶ PDF sink (streaming only)
//!  ├─ 4. Drain    stderr lines: msg| ──▶ observer, fin| ──▶ final status
//!  └─ 5. Result   Ok(status == "success")
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prince_driver::{Prince, TracingEvents};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut prince = Prince::with_events("/usr/bin/prince", Arc::new(TracingEvents));
//!     prince.config_mut().add_style_sheet("print.css");
//!
//!     let ok = prince.convert_to_file("invoice.html", "invoice.pdf").await?;
//!     eprintln!("converted: {ok}");
//!     Ok(())
//! }
//! ```
//!
//! ## Results and Errors
//!
//! A document the engine cannot convert is `Ok(false)`, not an error; the
//! reasons arrive through the observer. `Err(PrinceError)` means the driver
//! itself failed: a bad key size, an engine that would not start, or a
//! broken pipe.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `princeconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! prince-driver = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod events;
pub mod process;
pub mod protocol;
pub mod relay;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use command::{build_command_line, CommandLine};
pub use config::{Encryption, InputType, KeyBits, Permissions, PrinceConfig, PrinceConfigBuilder};
pub use convert::Prince;
pub use error::{PrinceError, RelayDirection};
pub use events::{Diagnostic, EventsHandle, PrinceEvents, Severity, TracingEvents};
pub use protocol::ProtocolEvent;
