//! Bridges the synchronous PDF writer to an asynchronous response body.
//!
//! The renderer runs on the blocking pool and writes through [`ChannelWriter`];
//! chunks cross an mpsc channel and come out as a stream suitable for
//! `Body::from_stream`. Dropping the receiving side (client disconnect)
//! surfaces as a broken pipe to the writer, which stops the render.

use std::io;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// In-flight chunks before the blocking writer backpressures.
const CHANNEL_CAPACITY: usize = 8;

type Chunk = Result<Bytes, io::Error>;

/// `std::io::Write` half of the bridge, used from the blocking pool only
/// (`blocking_send` panics on an async worker thread).
pub struct ChannelWriter {
    tx: mpsc::Sender<Chunk>,
}

/// Creates the writer/stream pair.
pub fn channel() -> (ChannelWriter, ReceiverStream<Chunk>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (ChannelWriter { tx }, ReceiverStream::new(rx))
}

impl ChannelWriter {
    /// Terminates the body stream with an error after a mid-render failure.
    /// Bytes already sent cannot be retracted; erroring the stream makes the
    /// server abort the connection instead of ending the body cleanly.
    pub fn fail(self, message: String) {
        let _ = self
            .tx
            .blocking_send(Err(io::Error::new(io::ErrorKind::Other, message)));
    }
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
