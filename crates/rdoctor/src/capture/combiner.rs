//! Fan-in of the stdout and stderr readers into one delivery channel.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use rdoctor_core::{CapturedLine, Origin};

/// Merge both reader channels into `merged` in arrival order.
///
/// `merged` is closed once both inputs have closed, and only then is
/// `drained` signalled. No ordering is imposed across the two streams.
pub async fn combine(
    stdout: mpsc::Receiver<CapturedLine>,
    stderr: mpsc::Receiver<CapturedLine>,
    merged: mpsc::Sender<CapturedLine>,
    drained: oneshot::Sender<()>,
) {
    let mut stdout = Some(stdout);
    let mut stderr = Some(stderr);

    while stdout.is_some() || stderr.is_some() {
        let (origin, next) = tokio::select! {
            line = next_line(&mut stdout) => (Origin::Stdout, line),
            line = next_line(&mut stderr) => (Origin::Stderr, line),
        };
        match next {
            Some(line) => {
                trace!(%line, "Merged line");
                // Keep draining the readers even if nobody listens downstream.
                let _ = merged.send(line).await;
            }
            None => {
                debug!(stream = %origin, "Stream drained");
                match origin {
                    Origin::Stdout => stdout = None,
                    Origin::Stderr => stderr = None,
                }
            }
        }
    }

    drop(merged);
    let _ = drained.send(());
}

async fn next_line(rx: &mut Option<mpsc::Receiver<CapturedLine>>) -> Option<CapturedLine> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn filled(origin: Origin, count: u64) -> mpsc::Receiver<CapturedLine> {
        let (tx, rx) = mpsc::channel(64);
        for seq in 1..=count {
            tx.try_send(CapturedLine::content(origin, seq, format!("{origin}-{seq}")))
                .unwrap();
        }
        tx.try_send(CapturedLine::terminal(origin, count + 1)).unwrap();
        rx
    }

    #[tokio::test]
    async fn merges_both_streams_preserving_per_stream_order() {
        let (merged_tx, mut merged_rx) = mpsc::channel(128);
        let (drained_tx, drained_rx) = oneshot::channel();

        combine(
            filled(Origin::Stdout, 5),
            filled(Origin::Stderr, 3),
            merged_tx,
            drained_tx,
        )
        .await;

        let mut out = Vec::new();
        while let Some(line) = merged_rx.recv().await {
            out.push(line);
        }
        drained_rx.await.unwrap();

        let seq_of = |origin| -> Vec<u64> {
            out.iter()
                .filter(|l| l.origin == origin)
                .map(|l| l.sequence)
                .collect()
        };
        assert_eq!(seq_of(Origin::Stdout), [1, 2, 3, 4, 5, 6]);
        assert_eq!(seq_of(Origin::Stderr), [1, 2, 3, 4]);
        assert_eq!(out.iter().filter(|l| l.terminal).count(), 2);
    }

    #[tokio::test]
    async fn drained_waits_for_both_inputs() {
        let (merged_tx, mut merged_rx) = mpsc::channel(16);
        let (drained_tx, mut drained_rx) = oneshot::channel();
        let (stderr_tx, stderr_rx) = mpsc::channel(16);

        let task = tokio::spawn(combine(
            filled(Origin::Stdout, 1),
            stderr_rx,
            merged_tx,
            drained_tx,
        ));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(drained_rx.try_recv().is_err());
        assert_eq!(merged_rx.recv().await.unwrap().sequence, 1);
        assert!(merged_rx.recv().await.unwrap().terminal);

        stderr_tx
            .send(CapturedLine::terminal(Origin::Stderr, 1))
            .await
            .unwrap();
        drop(stderr_tx);
        task.await.unwrap();

        let last = merged_rx.recv().await.unwrap();
        assert_eq!(last.origin, Origin::Stderr);
        assert!(last.terminal);
        assert!(merged_rx.recv().await.is_none());
        drained_rx.await.unwrap();
    }

    #[tokio::test]
    async fn merged_lines_are_traced_in_display_form() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (merged_tx, mut merged_rx) = mpsc::channel(16);
        let (drained_tx, _drained_rx) = oneshot::channel();
        combine(
            filled(Origin::Stdout, 1),
            filled(Origin::Stderr, 0),
            merged_tx,
            drained_tx,
        )
        .await;
        while merged_rx.recv().await.is_some() {}

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("L001 stdout-1"), "logs: {text}");
        assert!(text.contains("EOF L002"), "logs: {text}");
        assert!(text.contains("STDERR"), "logs: {text}");
    }
}
