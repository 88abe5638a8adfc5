//! Byte relays between the caller's streams and the engine's pipes.
//!
//! Bytes pass through unmodified. Each relay owns the engine end it talks to
//! and releases it when done; the caller's end is only borrowed.

use crate::error::{PrinceError, RelayDirection};
use tokio::io::{self, AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{ChildStdin, ChildStdout};
use tracing::debug;

/// Copy the document from `document` into the engine's stdin, then close
/// stdin so the engine sees end-of-input. `document` is left open.
pub async fn relay_input<R>(document: &mut R, mut stdin: ChildStdin) -> Result<u64, PrinceError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let relay_failed = |source| PrinceError::RelayFailed {
        direction: RelayDirection::ToEngine,
        source,
    };

    let n = io::copy(document, &mut stdin).await.map_err(relay_failed)?;
    stdin.shutdown().await.map_err(relay_failed)?;
    drop(stdin);

    debug!("Sent {} document bytes to engine", n);
    Ok(n)
}

/// Copy the engine's stdout into `sink` until the engine closes it, then
/// flush `sink`. The sink stays open and owned by the caller.
pub async fn relay_output<W>(mut stdout: ChildStdout, sink: &mut W) -> Result<u64, PrinceError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let relay_failed = |source| PrinceError::RelayFailed {
        direction: RelayDirection::FromEngine,
        source,
    };

    let n = io::copy(&mut stdout, sink).await.map_err(relay_failed)?;
    sink.flush().await.map_err(relay_failed)?;

    debug!("Received {} PDF bytes from engine", n);
    Ok(n)
}
