//! A scripted in-memory [`Socket`] for protocol tests.
//!
//! Tests queue the server's side of the conversation up front; everything
//! the client writes is captured for inspection. The handle is cheaply
//! cloneable so a test can keep one end while the connection owns the other.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};

use crate::net::Socket;

#[derive(Clone, Default)]
pub(crate) struct MockSocket {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    read: VecDeque<u8>,
    written: Vec<u8>,
}

impl MockSocket {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue one packet frame from the server. `payload` must fit a single
    /// frame; splits are scripted explicitly with repeated calls.
    pub(crate) fn push_frame(&self, sequence_id: u8, payload: &[u8]) {
        assert!(payload.len() <= 0xff_ffff, "frame payload too large");

        let mut inner = self.inner.lock().unwrap();

        inner.read.extend(&(payload.len() as u32).to_le_bytes()[..3]);
        inner.read.extend(&[sequence_id]);
        inner.read.extend(payload);
    }

    /// Everything the client has written so far, decoded into
    /// `(sequence_id, payload)` frames.
    pub(crate) fn written_frames(&self) -> Vec<(u8, Vec<u8>)> {
        let inner = self.inner.lock().unwrap();
        let mut buf = &inner.written[..];
        let mut frames = Vec::new();

        while buf.len() >= 4 {
            let len = buf.get_uint_le(3) as usize;
            let sequence_id = buf.get_u8();

            let (payload, rest) = buf.split_at(len);
            frames.push((sequence_id, payload.to_vec()));
            buf = rest;
        }

        frames
    }

    /// Drop everything captured so far, so the next assertion sees only the
    /// frames of the command under test.
    pub(crate) fn clear_written(&self) {
        self.inner.lock().unwrap().written.clear();
    }
}

impl Socket for MockSocket {
    fn try_read(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();

        if inner.read.is_empty() {
            // a scripted conversation that runs dry is end-of-stream
            return Ok(0);
        }

        let n = inner.read.len();
        buf.extend(inner.read.drain(..));

        Ok(n)
    }

    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().written.extend_from_slice(buf);

        Ok(buf.len())
    }

    fn poll_read_ready(&mut self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_write_ready(&mut self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(&mut self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
