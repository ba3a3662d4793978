//! Concurrent line drains for the child's output pipes.
//!
//! Each pipe gets its own task so a child blocked writing to one stream
//! never stalls the other. Lines travel over an unbounded channel, which
//! keeps the pipe empty and lets the collector keep everything received
//! even when the drain has to be abandoned.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, trace, Dispatch};

/// A running drain over one output pipe.
pub struct StreamDrain {
    name: &'static str,
    rx: mpsc::UnboundedReceiver<String>,
    handle: JoinHandle<()>,
}

impl StreamDrain {
    /// Start draining `reader` on a new task that logs through `dispatch`.
    pub fn spawn<R>(name: &'static str, reader: R, dispatch: &Dispatch) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(pump(name, reader, tx).with_subscriber(dispatch.clone()));
        Self { name, rx, handle }
    }

    /// Gather the drained text, waiting at most `grace` for the pipe to close.
    ///
    /// Every line is followed by `\n`. If the grace period runs out the drain
    /// task is aborted and the lines received so far are returned.
    pub async fn collect(mut self, grace: Duration) -> String {
        let mut text = String::new();

        let finished = tokio::time::timeout(grace, async {
            while let Some(line) = self.rx.recv().await {
                push_line(&mut text, &line);
            }
        })
        .await;

        if finished.is_err() {
            debug!(
                stream = self.name,
                "{} still open after {:?}, keeping partial output", self.name, grace
            );
            self.handle.abort();
            while let Ok(line) = self.rx.try_recv() {
                push_line(&mut text, &line);
            }
        }

        text
    }

    /// Stop the drain without collecting.
    pub fn abort(self) {
        self.handle.abort();
    }
}

fn push_line(text: &mut String, line: &str) {
    text.push_str(line);
    text.push('\n');
}

/// Strip one trailing `\n` or `\r\n`.
fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

async fn pump<R>(name: &'static str, reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                trace!(stream = name, "{}: EOF", name);
                break;
            }
            Ok(n) => {
                trace!(stream = name, "{}: read {} bytes", name, n);
                trim_line_ending(&mut buf);
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(line).is_err() {
                    debug!(stream = name, "{}: collector gone", name);
                    break;
                }
            }
            Err(e) => {
                error!(stream = name, "Error reading {}: {}", name, e);
                break;
            }
        }
    }
}
