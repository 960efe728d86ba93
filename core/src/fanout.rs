//! Input fanout: copy one source stream to many sinks.
//!
//! Every chunk read from the source is written to each sink in registration
//! order before the next read. The first failing write aborts the broadcast:
//! later sinks miss that chunk and the source is not read again. Whatever the
//! outcome, the source is dropped and every sink is closed, best-effort.
//!
//! Sinks are synchronous, so a stalled sink stalls the whole broadcast. A
//! [`channel`] sink buffers in memory instead and never stalls.

use std::fs::File;
use std::io::{self, PipeWriter, Read, Write};
use std::process::ChildStdin;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::error::FanoutError;

const CHUNK_SIZE: usize = 32 * 1024;

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// A fanout destination that can be closed explicitly.
pub trait Sink: Write + Send {
    /// Flush and release the destination. Called exactly once, after the
    /// broadcast ends.
    fn close(&mut self) -> io::Result<()>;
}

impl Sink for PipeWriter {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for File {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for ChildStdin {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for Vec<u8> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Channel sink
// ---------------------------------------------------------------------------

/// An unbounded in-memory pipe: chunks written to the [`ChannelSink`] are
/// read back in order from the [`ChannelSource`]. Writes never block, so a
/// consumer that has not started yet cannot stall the broadcast.
pub fn channel() -> (ChannelSink, ChannelSource) {
    let (tx, rx) = mpsc::channel();
    (
        ChannelSink { tx: Some(tx) },
        ChannelSource {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Write end of [`channel`]. Closing it ends the source's stream.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<Sender<Vec<u8>>>,
}

impl Write for ChannelSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "channel sink closed"))?;
        tx.send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel source dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for ChannelSink {
    fn close(&mut self) -> io::Result<()> {
        self.tx = None;
        Ok(())
    }
}

/// Read end of [`channel`]. Reports end of stream once the sink is closed
/// or dropped and every buffered chunk has been read.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for ChannelSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos == self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Fanout
// ---------------------------------------------------------------------------

/// Broadcasts one source to an ordered set of sinks.
///
/// `run` consumes the fanout, so sinks can only be added before it starts
/// and it can only run once.
pub struct Fanout<R> {
    source: R,
    sinks: Vec<Box<dyn Sink>>,
}

impl<R: Read> Fanout<R> {
    pub fn new(source: R) -> Self {
        Fanout {
            source,
            sinks: Vec::new(),
        }
    }

    /// Register a destination. Returns its index, which identifies it in a
    /// [`FanoutError::Write`].
    pub fn add_sink(&mut self, sink: impl Sink + 'static) -> usize {
        self.sinks.push(Box::new(sink));
        self.sinks.len() - 1
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Copy the source to every sink until the source is exhausted or a
    /// read or write fails. Returns the number of bytes read from the source.
    pub fn run(self) -> Result<u64, FanoutError> {
        let Fanout { mut source, mut sinks } = self;
        let result = broadcast(&mut source, &mut sinks);
        drop(source);

        for (index, sink) in sinks.iter_mut().enumerate() {
            if let Err(e) = sink.close() {
                tracing::warn!(sink = index, error = %e, "failed to close fanout sink");
            }
        }
        drop(sinks);

        match &result {
            Ok(bytes) => tracing::debug!(bytes, "fanout complete"),
            Err(e) => tracing::debug!(error = %e, "fanout aborted"),
        }
        result
    }
}

impl<R: Read + Send + 'static> Fanout<R> {
    /// Run the broadcast on its own thread.
    pub fn spawn(self) -> io::Result<JoinHandle<Result<u64, FanoutError>>> {
        thread::Builder::new()
            .name("parrun-fanout".into())
            .spawn(move || self.run())
    }
}

fn broadcast<R: Read>(source: &mut R, sinks: &mut [Box<dyn Sink>]) -> Result<u64, FanoutError> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FanoutError::Read(e)),
        };
        for (index, sink) in sinks.iter_mut().enumerate() {
            sink.write_all(&chunk[..n])
                .map_err(|source| FanoutError::Write { sink: index, source })?;
        }
        total += n as u64;
    }
}
