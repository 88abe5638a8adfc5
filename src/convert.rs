//! Conversion entry points.
//!
//! Every `convert*` method runs one engine process through the same steps:
//!
//! ```text
//! Building   PrinceConfig ──▶ CommandLine (+ mode flags)
//! Launched   spawn engine, take its pipes
//! Relaying   document ──▶ stdin, stdout ──▶ sink   (streaming modes only)
//! Draining   read stderr status protocol, dispatch diagnostics
//! Done       result = final status == "success"
//! ```
//!
//! Relaying and draining run concurrently: an engine may start writing PDF
//! bytes or log lines before it has read all of its input, and blocking on
//! any single pipe could deadlock both processes. The five modes only differ
//! in the mode flags they append and which pipes they connect.
//!
//! The result is known once stderr closes. The engine then gets
//! [`EXIT_GRACE`](crate::process::EXIT_GRACE) to exit before it is killed.

use crate::command::{build_command_line, CommandLine};
use crate::config::PrinceConfig;
use crate::error::PrinceError;
use crate::events::{EventsHandle, PrinceEvents};
use crate::process::{spawn_engine, Pipes};
use crate::protocol::{is_success, read_messages};
use crate::relay::{relay_input, relay_output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Read the document from stdin / write the PDF to stdout.
const STDIO: &str = "-";

/// Driver for one Prince engine executable.
///
/// Holds the executable path, the conversion options and an optional
/// observer. Configure once, convert many times: each call builds its command
/// line from the current config, so changes made between calls apply to the
/// next conversion only.
///
/// # Example
/// ```rust,no_run
/// use prince_driver::{Prince, TracingEvents};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut prince = Prince::with_events("/usr/bin/prince", Arc::new(TracingEvents));
/// prince.config_mut().add_style_sheet("print.css").set_javascript(true);
///
/// if prince.convert_to_file("report.html", "report.pdf").await? {
///     println!("done");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Prince {
    exe_path: PathBuf,
    config: PrinceConfig,
    events: Option<EventsHandle>,
}

impl std::fmt::Debug for Prince {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prince")
            .field("exe_path", &self.exe_path)
            .field("config", &self.config)
            .field("events", &self.events.as_ref().map(|_| "<dyn PrinceEvents>"))
            .finish()
    }
}

impl Prince {
    /// Driver for the engine at `exe_path` (e.g. `/usr/bin/prince`) with
    /// default options and no observer.
    pub fn new(exe_path: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: exe_path.into(),
            config: PrinceConfig::default(),
            events: None,
        }
    }

    /// Driver whose engine diagnostics go to `events`.
    pub fn with_events(exe_path: impl Into<PathBuf>, events: Arc<dyn PrinceEvents>) -> Self {
        Self {
            events: Some(events),
            ..Self::new(exe_path)
        }
    }

    /// Replace the config, e.g. with one built by [`PrinceConfig::builder`].
    pub fn with_config(mut self, config: PrinceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    pub fn config(&self) -> &PrinceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PrinceConfig {
        &mut self.config
    }

    pub fn set_config(&mut self, config: PrinceConfig) {
        self.config = config;
    }

    /// Register, replace or remove the observer.
    pub fn set_events(&mut self, events: Option<Arc<dyn PrinceEvents>>) {
        self.events = events;
    }

    /// Command line for the current config, without mode flags.
    pub fn command_line(&self) -> CommandLine {
        build_command_line(&self.exe_path, &self.config)
    }

    /// Convert `input` to a PDF next to it, named like the input with a
    /// `.pdf` extension.
    ///
    /// Returns `Ok(false)` if the engine reports failure; the reasons go to
    /// the observer.
    pub async fn convert(&self, input: impl AsRef<Path>) -> Result<bool, PrinceError> {
        let mut cmd = self.command_line();
        cmd.push("--server");
        cmd.push(input.as_ref());

        self.run(cmd, Io::Files).await
    }

    /// Convert `input` to the PDF file `output`.
    pub async fn convert_to_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<bool, PrinceError> {
        let mut cmd = self.command_line();
        cmd.push("--server");
        cmd.push(input.as_ref());
        cmd.push(output.as_ref());

        self.run(cmd, Io::Files).await
    }

    /// Convert several documents, in order, into one PDF file `output`.
    pub async fn convert_multiple<P>(
        &self,
        inputs: &[P],
        output: impl AsRef<Path>,
    ) -> Result<bool, PrinceError>
    where
        P: AsRef<Path>,
    {
        let mut cmd = self.command_line();
        cmd.push("--server");
        cmd.push_pair("--output", output.as_ref());
        for input in inputs {
            cmd.push(input.as_ref());
        }

        self.run(cmd, Io::Files).await
    }

    /// Convert `input` and write the PDF to `pdf_output`.
    ///
    /// The engine runs with `--silent`, so expect few or no diagnostics;
    /// request a log file with [`PrinceConfig::set_log`] for details.
    pub async fn convert_to_writer<W>(
        &self,
        input: impl AsRef<Path>,
        pdf_output: &mut W,
    ) -> Result<bool, PrinceError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut cmd = self.command_line();
        cmd.push("--server");
        cmd.push("--silent");
        cmd.push(input.as_ref());
        cmd.push("-o");
        cmd.push(STDIO);

        self.run(cmd, Io::Output(pdf_output)).await
    }

    /// Read a document from `document`, write the PDF to `pdf_output`.
    ///
    /// A streamed document has no filename: set
    /// [`PrinceConfig::base_url`] to resolve relative links, and
    /// [`PrinceConfig::set_html`] for HTML input.
    pub async fn convert_stream<R, W>(
        &self,
        document: &mut R,
        pdf_output: &mut W,
    ) -> Result<bool, PrinceError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut cmd = self.command_line();
        cmd.push("--server");
        cmd.push("--silent");
        cmd.push(STDIO);

        self.run(cmd, Io::Stream(document, pdf_output)).await
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn run(&self, cmd: CommandLine, io: Io<'_>) -> Result<bool, PrinceError> {
        let start = Instant::now();
        info!("Starting conversion: {}", cmd);

        let pipes = match io {
            Io::Files => Pipes::NONE,
            Io::Output(_) => Pipes::OUTPUT,
            Io::Stream(..) => Pipes::BOTH,
        };
        let mut engine = spawn_engine(&cmd, pipes)?;
        debug!("Engine launched (pid {:?})", engine.id());

        let (document, sink) = match io {
            Io::Files => (None, None),
            Io::Output(sink) => (None, Some(sink)),
            Io::Stream(document, sink) => (Some(document), Some(sink)),
        };
        let input_relay = document.zip(engine.stdin.take());
        let output_relay = sink.zip(engine.stdout.take());
        if input_relay.is_some() || output_relay.is_some() {
            debug!("Relaying document/PDF bytes");
        }

        let send = async {
            match input_relay {
                Some((document, stdin)) => relay_input(document, stdin).await.map(Some),
                None => Ok(None),
            }
        };
        let receive = async {
            match output_relay {
                Some((sink, stdout)) => relay_output(stdout, sink).await.map(Some),
                None => Ok(None),
            }
        };
        let drain = read_messages(&mut engine.stderr, self.events.as_deref());

        let (sent, received, status) = tokio::try_join!(send, receive, drain)?;
        debug!(
            "Engine finished: sent {:?} bytes, received {:?} bytes",
            sent, received
        );

        // Bounded by EXIT_GRACE; an engine that lingers is killed.
        engine.wait().await;

        let ok = is_success(status.as_deref());
        info!(
            "Conversion {} in {}ms",
            if ok { "succeeded" } else { "failed" },
            start.elapsed().as_millis()
        );
        Ok(ok)
    }
}

/// Which caller streams an invocation is wired to.
enum Io<'a> {
    /// The engine reads and writes files itself.
    Files,
    /// PDF bytes come back on stdout.
    Output(&'a mut (dyn AsyncWrite + Unpin + Send)),
    /// Document goes in on stdin, PDF comes back on stdout.
    Stream(
        &'a mut (dyn AsyncRead + Unpin + Send),
        &'a mut (dyn AsyncWrite + Unpin + Send),
    ),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Permissions;

    #[test]
    fn command_line_snapshot_follows_config() {
        let mut prince = Prince::new("/usr/bin/prince");
        assert_eq!(prince.command_line().to_strings(), vec!["/usr/bin/prince"]);

        prince.config_mut().add_style_sheet("a.css").set_javascript(true);
        assert_eq!(
            prince.command_line().to_strings(),
            vec!["/usr/bin/prince", "--style=a.css", "--javascript"]
        );
    }

    #[test]
    fn with_config_replaces_options() {
        let config = PrinceConfig::builder()
            .encrypt_info(128, "", "owner", Permissions::default())
            .build()
            .unwrap();
        let prince = Prince::new("prince").with_config(config.clone());
        assert_eq!(prince.config(), &config);
        assert_eq!(prince.exe_path(), Path::new("prince"));
    }

    #[test]
    fn debug_hides_observer() {
        let prince = Prince::with_events("prince", Arc::new(crate::events::TracingEvents));
        let dbg = format!("{prince:?}");
        assert!(dbg.contains("<dyn PrinceEvents>"), "got: {dbg}");
    }

    #[tokio::test]
    async fn missing_engine_is_launch_failure_in_every_mode() {
        let prince = Prince::new("/definitely/not/a/real/prince");

        let err = prince.convert("in.html").await.unwrap_err();
        assert!(matches!(err, PrinceError::LaunchFailed { .. }));

        let err = prince
            .convert_multiple(&["a.html", "b.html"], "out.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PrinceError::LaunchFailed { .. }));

        let mut sink = Vec::new();
        let mut document = &b"<html/>"[..];
        let err = prince
            .convert_stream(&mut document, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, PrinceError::LaunchFailed { .. }));
        assert!(sink.is_empty());
    }
}
