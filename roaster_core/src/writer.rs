//! Line sinks for telemetry: stdout, file, tee and a background writer.
//!
//! `LineWriter` spawns one thread that owns the real sink and drains a bounded
//! channel. The control loop never blocks on it: when the channel is full the
//! line is dropped and counted. The thread is joined when the writer is
//! dropped, after it has flushed everything already queued.
use crossbeam_channel as xch;
use roaster_traits::{BoxError, LineSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

/// Appends lines to a file, flushing after each one.
#[derive(Debug)]
pub struct FileSink {
    out: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

impl LineSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes every line to both sinks; the first failure wins.
pub struct TeeSink<A, B> {
    a: A,
    b: B,
}

impl<A: LineSink, B: LineSink> TeeSink<A, B> {
    pub const fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<A: LineSink, B: LineSink> LineSink for TeeSink<A, B> {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        let ra = self.a.write_line(line);
        let rb = self.b.write_line(line);
        ra.and(rb)
    }
}

pub struct LineWriter {
    tx: Option<xch::Sender<String>>,
    dropped: Arc<AtomicU64>,
    written: Arc<AtomicU64>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl LineWriter {
    pub fn spawn<S: LineSink + Send + 'static>(mut sink: S, capacity: usize) -> Self {
        let (tx, rx) = xch::bounded::<String>(capacity.max(1));
        let written = Arc::new(AtomicU64::new(0));
        let written_clone = written.clone();

        let join_handle = std::thread::spawn(move || {
            // Ends once every sender is gone and the queue is drained
            for line in rx.iter() {
                match sink.write_line(&line) {
                    Ok(()) => {
                        written_clone.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "telemetry write failed");
                    }
                }
            }
            tracing::trace!("LineWriter thread exiting cleanly");
        });

        Self {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
            written,
            join_handle: Some(join_handle),
        }
    }

    /// Lines discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Lines the thread has written successfully so far.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

impl LineSink for LineWriter {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        let Some(tx) = self.tx.as_ref() else {
            return Err("line writer closed".into());
        };
        match tx.try_send(line.to_owned()) {
            Ok(()) => Ok(()),
            Err(xch::TrySendError::Full(_)) => {
                let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::trace!(dropped = n, "telemetry queue full, line dropped");
                Ok(())
            }
            Err(xch::TrySendError::Disconnected(_)) => Err("line writer thread exited".into()),
        }
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain and exit
        drop(self.tx.take());
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("LineWriter thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "LineWriter thread panicked during shutdown");
                }
            }
        }
    }
}
