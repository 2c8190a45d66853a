//! Stream reader: turns one child output stream into captured lines.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rdoctor_core::{CapturedLine, Origin};

/// Capacity of the private channel between a reader and the combiner.
///
/// Content lines are offered with `try_send`, so this only absorbs
/// scheduling jitter; a combiner that falls further behind loses lines.
pub const READER_HANDOFF_CAPACITY: usize = 64;

/// Read `source` line by line until end-of-stream or a read error.
///
/// Each content line is offered to `tx` without waiting (and dropped if the
/// channel is full), then its raw bytes are echoed to `echo`. The terminal
/// record is always delivered. `source` is borrowed so that its owner decides
/// when the pipe is closed.
///
/// Returns the number of content lines read.
pub async fn read_lines<R, W>(
    source: &mut R,
    mut echo: W,
    origin: Origin,
    tx: mpsc::Sender<CapturedLine>,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut buf = Vec::with_capacity(256);
    let mut sequence: u64 = 1;
    let mut echo_enabled = true;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(stream = %origin, error = %e, "Could not read from pipe");
                break;
            }
        }

        let raw = strip_terminator(&buf);
        let line = CapturedLine::content(origin, sequence, String::from_utf8_lossy(raw));
        // Lossy by contract: local echo is authoritative, the remote copy is not.
        let _ = tx.try_send(line);

        if echo_enabled {
            if let Err(e) = echo_line(&mut echo, raw).await {
                warn!(
                    stream = %origin,
                    error = %e,
                    "Local echo failed, no longer echoing this stream"
                );
                echo_enabled = false;
            }
        }
        sequence += 1;
    }

    if tx.send(CapturedLine::terminal(origin, sequence)).await.is_err() {
        debug!(stream = %origin, "Combiner closed before end-of-stream record");
    }
    sequence - 1
}

async fn echo_line<W: AsyncWrite + Unpin>(echo: &mut W, raw: &[u8]) -> std::io::Result<()> {
    echo.write_all(raw).await?;
    echo.write_all(b"\n").await?;
    echo.flush().await
}

/// Drop a trailing `\n`, then a trailing `\r`.
fn strip_terminator(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}
