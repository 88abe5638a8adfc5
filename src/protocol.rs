//! The engine's status protocol on stderr.
//!
//! In `--server` mode the engine writes one record per line to stderr. The
//! first four characters are a tag, the rest is the body:
//!
//! ```text
//! msg|wrn|chapter1.html:12|unknown CSS property 'colour'
//! ^^^^ ^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! tag  type location       text (from the '|' on)
//!
//! fin|success
//! ^^^^ ^^^^^^^
//! tag  final status
//! ```
//!
//! Lines end at `\n`, `\r\n` or a lone `\r`. Lines that are too short,
//! carry an unknown tag, or have a malformed `msg|` body are skipped without
//! error so newer engines can add record types. Only an I/O failure on the
//! stream itself is an error.

use crate::error::PrinceError;
use crate::events::{Diagnostic, PrinceEvents, Severity};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Tag of a diagnostic record.
pub const MESSAGE_TAG: &str = "msg|";
/// Tag of the final status record.
pub const FINISHED_TAG: &str = "fin|";
/// Final status body meaning the PDF was produced.
pub const SUCCESS: &str = "success";

const TAG_LEN: usize = 4;

/// A decoded stderr record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    Message(Diagnostic),
    Finished(String),
}

/// Split a line into its 4-character tag and body.
///
/// `None` for lines shorter than the tag.
pub fn split_tag(line: &str) -> Option<(&str, &str)> {
    let end = char_offset(line, TAG_LEN)?;
    Some(line.split_at(end))
}

/// Decode the body of a `msg|` record.
///
/// The first three characters are the type token; the character after them
/// is a separator and is not checked. The location runs up to the next `|`
/// and the text is everything from that `|` on. `None` if the body is
/// shorter than four characters or has no second `|`.
pub fn decode_message(body: &str) -> Option<Diagnostic> {
    let token_end = char_offset(body, 3)?;
    let rest = &body[char_offset(body, 4)?..];
    let split = rest.find('|')?;
    let (location, text) = rest.split_at(split);
    Some(Diagnostic {
        severity: Severity::from_token(&body[..token_end]),
        location: location.to_string(),
        text: text.to_string(),
    })
}

/// A line sorted by its tag, body not yet decoded.
enum Record<'a> {
    Message(&'a str),
    Finished(&'a str),
}

fn classify(line: &str) -> Option<Record<'_>> {
    let (tag, body) = split_tag(line)?;
    match tag {
        MESSAGE_TAG => Some(Record::Message(body)),
        FINISHED_TAG => Some(Record::Finished(body)),
        _ => None,
    }
}

/// Decode one complete line, or `None` if it should be ignored.
pub fn decode_line(line: &str) -> Option<ProtocolEvent> {
    match classify(line)? {
        Record::Message(body) => decode_message(body).map(ProtocolEvent::Message),
        Record::Finished(body) => Some(ProtocolEvent::Finished(body.to_string())),
    }
}

/// Whether a final status body means success.
pub fn is_success(status: Option<&str>) -> bool {
    status == Some(SUCCESS)
}

/// Read the engine's stderr to the end.
///
/// Each `msg|` record is decoded and handed to `events` as soon as it is
/// read; without an observer the records are skipped undecoded. Returns the
/// body of the last `fin|` record, or `None` if the engine never sent one.
///
/// # Errors
/// [`PrinceError::MessageReadFailed`] if reading the stream fails. Bad
/// records never fail.
pub async fn read_messages<R>(
    stderr: R,
    events: Option<&dyn PrinceEvents>,
) -> Result<Option<String>, PrinceError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut status = None;
    let mut lines = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| PrinceError::MessageReadFailed { source })?;
        if n == 0 {
            break;
        }

        // A lone '\r' also ends a line.
        for raw in buf.strip_suffix(b"\n").unwrap_or(&buf[..]).split(|&b| b == b'\r') {
            if raw.is_empty() {
                continue;
            }
            lines += 1;
            let line = String::from_utf8_lossy(raw);
            match classify(&line) {
                Some(Record::Message(body)) => {
                    if let Some(events) = events {
                        if let Some(msg) = decode_message(body) {
                            events.on_message(&msg);
                        }
                    }
                }
                Some(Record::Finished(body)) => status = Some(body.to_string()),
                None => {}
            }
        }
    }

    debug!("Engine closed stderr after {} lines, status {:?}", lines, status);
    Ok(status)
}

/// Byte offset just past the first `n` characters of `s`.
fn char_offset(s: &str, n: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(n)
}
