use bytes::{Bytes, BytesMut};

use crate::error::{Error, FramingError, Result};
use crate::net::Socket;

// tokio, async-std, and std all use this as their default buffered I/O capacity
const DEFAULT_BUF_SIZE: usize = 8192;

/// Buffers reads and writes around an underlying [`Socket`].
///
/// The read side accumulates bytes until a caller-requested length is
/// available; the write side batches serialized packets until
/// [`flush`][Self::flush] pushes them down the socket.
pub(crate) struct BufferedSocket<S = Box<dyn Socket>> {
    socket: S,
    write_buf: Vec<u8>,
    flushed: usize,
    read_buf: BytesMut,
}

impl<S: Socket> BufferedSocket<S> {
    pub(crate) fn new(socket: S) -> Self {
        Self {
            socket,
            write_buf: Vec::with_capacity(DEFAULT_BUF_SIZE),
            flushed: 0,
            read_buf: BytesMut::with_capacity(DEFAULT_BUF_SIZE),
        }
    }

    /// Read exactly `len` bytes, waiting on the socket as needed.
    ///
    /// End-of-stream before `len` bytes are available is a
    /// [`FramingError::UnexpectedEof`]: the server hung up mid-message.
    pub(crate) async fn read_exact(&mut self, len: usize) -> Result<Bytes> {
        while self.read_buf.len() < len {
            let n = self.socket.read(&mut self.read_buf).await?;

            if n == 0 {
                return Err(Error::Framing(FramingError::UnexpectedEof));
            }
        }

        Ok(self.read_buf.split_to(len).freeze())
    }

    /// Access the outgoing buffer for packet serialization.
    pub(crate) fn write_buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.write_buf
    }

    pub(crate) fn is_write_buffer_empty(&self) -> bool {
        self.flushed >= self.write_buf.len()
    }

    pub(crate) async fn flush(&mut self) -> Result<()> {
        while self.flushed < self.write_buf.len() {
            let written = self.socket.write(&self.write_buf[self.flushed..]).await?;
            self.flushed += written;
        }

        self.write_buf.clear();
        self.flushed = 0;

        self.socket.flush().await?;

        Ok(())
    }

    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        self.flush().await?;
        self.socket.shutdown().await?;

        Ok(())
    }

    /// Drop excess capacity accumulated by oversized packets.
    pub(crate) fn shrink_buffers(&mut self) {
        if self.write_buf.capacity() > DEFAULT_BUF_SIZE {
            self.write_buf.shrink_to(DEFAULT_BUF_SIZE);
        }

        if self.read_buf.capacity() > DEFAULT_BUF_SIZE && self.read_buf.is_empty() {
            // `BytesMut` cannot shrink in place; replace the spare capacity
            self.read_buf = BytesMut::with_capacity(DEFAULT_BUF_SIZE);
        }
    }

    /// Unwrap the socket for a TLS upgrade.
    ///
    /// Callers must only do this at a quiet point in the protocol; buffered
    /// but unread bytes would otherwise be lost.
    pub(crate) fn into_inner(self) -> S {
        debug_assert!(self.read_buf.is_empty());

        self.socket
    }
}
