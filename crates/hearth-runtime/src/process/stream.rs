//! Async output readers (non-UTF8-safe).
//!
//! Game servers and tunnel agents can emit non-UTF8 bytes on stdout/stderr.
//! Using `BufReader::lines()` would terminate the reader on invalid UTF-8,
//! so lines are read as bytes and decoded lossily.
//!
//! One reader serves both pipes of a child. When both have closed it
//! reports the end of that child's lifetime exactly once.

use hearth_core::OutputExtractor;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatch::EventSender;

/// Spawn the reader task for one child.
///
/// Every line is queued as a raw copy followed by its typed event, if any.
/// A pipe that is `None` counts as already closed.
pub fn spawn_output_reader<O, E>(
    stdout: Option<O>,
    stderr: Option<E>,
    mut extractor: OutputExtractor,
    events: EventSender,
) -> JoinHandle<()>
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let role = extractor.role();
        let mut stdout = stdout.map(BufReader::new);
        let mut stderr = stderr.map(BufReader::new);
        let mut out_buf: Vec<u8> = Vec::with_capacity(1024);
        let mut err_buf: Vec<u8> = Vec::with_capacity(1024);

        while stdout.is_some() || stderr.is_some() {
            let line = tokio::select! {
                line = next_line(&mut stdout, &mut out_buf), if stdout.is_some() => line,
                line = next_line(&mut stderr, &mut err_buf), if stderr.is_some() => line,
            };
            let Some(line) = line else {
                continue;
            };

            let extracted = extractor.process(&line);
            if !events.send(extracted.raw) {
                debug!(?role, "Controller gone, output reader exiting");
                return;
            }
            if let Some(typed) = extracted.typed {
                events.send(typed);
            }
        }

        debug!(?role, "Output streams closed, reader task exiting");
        events.send(extractor.finish());
    })
}

/// Read the next line from `reader`, or `None` when it closed.
///
/// On EOF or a read error the reader is set to `None`. `buf` keeps partial
/// data across cancellation, so this is safe to use as a `select!` branch.
async fn next_line<R>(reader: &mut Option<R>, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let stream = reader.as_mut()?;
    match stream.read_until(b'\n', buf).await {
        Ok(0) => {
            *reader = None;
            None
        }
        Ok(_) => {
            // Trim trailing newline(s)
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            Some(line)
        }
        Err(e) => {
            debug!(error = %e, "Output stream read error, closing stream");
            *reader = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::event_queue;
    use hearth_core::{Event, RuleTable, StreamRole};
    use std::sync::Arc;
    use tokio_test::io::{Builder, Mock};

    fn server_extractor(lifetime: u64) -> OutputExtractor {
        OutputExtractor::new(Arc::new(RuleTable::server().unwrap()), lifetime)
    }

    #[tokio::test]
    async fn test_lines_then_single_stop() {
        let stdout = Builder::new()
            .read(b"Starting server\r\n")
            .read(b"Bob joined the game\n")
            .build();
        let (tx, mut rx) = event_queue();

        spawn_output_reader(Some(stdout), None::<Mock>, server_extractor(3), tx)
            .await
            .unwrap();

        assert_eq!(
            rx.drain(),
            vec![
                Event::raw(StreamRole::Server, "Starting server"),
                Event::raw(StreamRole::Server, "Bob joined the game"),
                Event::player_joined("Bob"),
                Event::StatusStopped {
                    role: StreamRole::Server,
                    lifetime: 3
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_does_not_end_reader() {
        let stdout = Builder::new()
            .read(b"bad \xff byte\n")
            .read(b"Alice joined the game\n")
            .build();
        let (tx, mut rx) = event_queue();

        spawn_output_reader(Some(stdout), None::<Mock>, server_extractor(1), tx)
            .await
            .unwrap();

        let events = rx.drain();
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], Event::player_joined("Alice"));
    }

    #[tokio::test]
    async fn test_stderr_merged_and_stop_waits_for_both() {
        let stdout = Builder::new().read(b"from stdout\n").build();
        let stderr = Builder::new()
            .read(b"from stderr\n")
            .read(b"Bob left the game\n")
            .build();
        let (tx, mut rx) = event_queue();

        spawn_output_reader(Some(stdout), Some(stderr), server_extractor(2), tx)
            .await
            .unwrap();

        let events = rx.drain();
        let stops = events
            .iter()
            .filter(|e| matches!(e, Event::StatusStopped { .. }))
            .count();
        assert_eq!(stops, 1);
        assert!(matches!(events.last(), Some(Event::StatusStopped { .. })));
        assert!(events.contains(&Event::raw(StreamRole::Server, "from stdout")));
        assert!(events.contains(&Event::raw(StreamRole::Server, "from stderr")));
        assert!(events.contains(&Event::player_left("Bob")));
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let stdout = Builder::new().read(b"partial").build();
        let (tx, mut rx) = event_queue();

        spawn_output_reader(Some(stdout), None::<Mock>, server_extractor(1), tx)
            .await
            .unwrap();

        assert_eq!(rx.drain()[0], Event::raw(StreamRole::Server, "partial"));
    }
}
