//! Launching the engine subprocess.
//!
//! stderr is always piped because it carries the status protocol. stdin and
//! stdout are only piped for the streaming modes; otherwise the engine reads
//! and writes files itself and they are connected to the null device.

use crate::command::CommandLine;
use crate::error::PrinceError;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// How long an engine may keep running after closing stderr before it is
/// killed.
pub const EXIT_GRACE: Duration = Duration::from_secs(3);

/// Which standard streams besides stderr to connect to the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pipes {
    pub stdin: bool,
    pub stdout: bool,
}

impl Pipes {
    /// Only stderr; the engine handles its own file I/O.
    pub const NONE: Pipes = Pipes {
        stdin: false,
        stdout: false,
    };
    /// PDF comes back on stdout.
    pub const OUTPUT: Pipes = Pipes {
        stdin: false,
        stdout: true,
    };
    /// Document goes in on stdin, PDF comes back on stdout.
    pub const BOTH: Pipes = Pipes {
        stdin: true,
        stdout: true,
    };
}

/// A running engine with its piped streams taken out of the child.
///
/// The child is killed if this is dropped before the engine exits, so an
/// aborted conversion never leaves an engine running.
pub struct EngineProcess {
    child: Child,
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr: ChildStderr,
}

impl EngineProcess {
    /// Process id, if the child has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the engine to exit, killing it if it is still running
    /// [`EXIT_GRACE`] after this is called.
    ///
    /// Called once stderr is closed, when the result is already known. The
    /// exit status does not decide the conversion result; it is only logged.
    pub async fn wait(mut self) -> Option<ExitStatus> {
        // Dropping our ends first lets an engine blocked on a pipe finish.
        drop(self.stdin.take());
        drop(self.stdout.take());
        let exited = tokio::time::timeout(EXIT_GRACE, self.child.wait()).await;
        match exited {
            Ok(Ok(status)) => {
                debug!("Engine exited with {}", status);
                Some(status)
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for engine process: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Engine still running {}s after closing stderr, killing it",
                    EXIT_GRACE.as_secs()
                );
                if let Err(e) = self.child.kill().await {
                    warn!("Failed to kill engine process: {}", e);
                }
                None
            }
        }
    }
}

/// Start the engine for `cmd`.
///
/// # Errors
/// [`PrinceError::LaunchFailed`] if the executable cannot be started.
pub fn spawn_engine(cmd: &CommandLine, pipes: Pipes) -> Result<EngineProcess, PrinceError> {
    let program = PathBuf::from(cmd.program());
    let launch_failed = |source| PrinceError::LaunchFailed {
        program: program.clone(),
        source,
    };

    let mut child = Command::new(cmd.program())
        .args(cmd.arguments())
        .stdin(stdio(pipes.stdin))
        .stdout(stdio(pipes.stdout))
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(launch_failed)?;

    debug!("Launched engine pid {:?}: {}", child.id(), cmd);

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| launch_failed(std::io::Error::other("engine stderr unavailable")))?;

    Ok(EngineProcess {
        stdin: child.stdin.take(),
        stdout: child.stdout.take(),
        stderr,
        child,
    })
}

fn stdio(piped: bool) -> Stdio {
    if piped {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_executable_is_launch_failure() {
        let cmd = CommandLine::new("/definitely/not/a/real/prince");
        let err = spawn_engine(&cmd, Pipes::NONE).err().unwrap();
        match err {
            PrinceError::LaunchFailed { program, source } => {
                assert_eq!(program, PathBuf::from("/definitely/not/a/real/prince"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pipes_are_taken_as_requested() {
        let mut cmd = CommandLine::new("/bin/sh");
        cmd.push("-c");
        cmd.push("exit 0");

        let engine = spawn_engine(&cmd, Pipes::NONE).unwrap();
        assert!(engine.stdin.is_none() && engine.stdout.is_none());
        assert!(engine.wait().await.unwrap().success());

        let engine = spawn_engine(&cmd, Pipes::BOTH).unwrap();
        assert!(engine.stdin.is_some() && engine.stdout.is_some());
        assert!(engine.wait().await.is_some());

        let engine = spawn_engine(&cmd, Pipes::OUTPUT).unwrap();
        assert!(engine.stdin.is_none() && engine.stdout.is_some());
        engine.wait().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lingering_engine_is_killed_after_grace() {
        let mut cmd = CommandLine::new("/bin/sh");
        cmd.push("-c");
        cmd.push("exec 2>&-; exec sleep 60");

        let engine = spawn_engine(&cmd, Pipes::NONE).unwrap();
        let start = std::time::Instant::now();
        assert!(engine.wait().await.is_none());
        let elapsed = start.elapsed();
        assert!(elapsed >= EXIT_GRACE, "returned after {elapsed:?}");
        assert!(elapsed < EXIT_GRACE + Duration::from_secs(10), "took {elapsed:?}");
    }
}
