use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{err_protocol, Error, FramingError, Result};
use crate::io::{MySqlBufExt, ProtocolDecode, ProtocolEncode};
use crate::net::{BufferedSocket, Socket};
use crate::options::{MySqlConnectOptions, MySqlSslMode};
use crate::protocol::response::{EofPacket, OkPacket, Status};
use crate::protocol::{Capabilities, Packet, MAX_PACKET_PAYLOAD};

/// The framed packet channel underneath a connection.
///
/// Owns the sequence counter, the effective capability set, the session
/// status flags, and the queue of response payloads the server still owes us
/// for commands whose streams were abandoned early.
pub(crate) struct MySqlStream {
    socket: BufferedSocket<Box<dyn Socket>>,
    pub(crate) capabilities: Capabilities,
    pub(crate) sequence_id: u8,
    pub(crate) waiting: VecDeque<Waiting>,
    pub(crate) status: Status,
    pub(crate) is_tls: bool,
    pub(crate) closed: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Waiting {
    // a response that starts with OK, ERR, or result-set metadata
    Result,

    // rows within a result set
    Row,
}

impl MySqlStream {
    pub(crate) fn new(socket: Box<dyn Socket>, options: &MySqlConnectOptions) -> Self {
        let mut capabilities = Capabilities::LONG_PASSWORD
            | Capabilities::FOUND_ROWS
            | Capabilities::LONG_FLAG
            | Capabilities::PROTOCOL_41
            | Capabilities::INTERACTIVE
            | Capabilities::TRANSACTIONS
            | Capabilities::SECURE_CONNECTION
            | Capabilities::MULTI_STATEMENTS
            | Capabilities::MULTI_RESULTS
            | Capabilities::PS_MULTI_RESULTS
            | Capabilities::PLUGIN_AUTH
            | Capabilities::SESSION_TRACK
            | Capabilities::DEPRECATE_EOF;

        capabilities |= options.extra_capabilities;

        if options.database.is_some() {
            capabilities |= Capabilities::CONNECT_WITH_DB;
        }

        if options.ssl_mode != MySqlSslMode::Disabled {
            capabilities |= Capabilities::SSL;
        }

        Self {
            socket: BufferedSocket::new(socket),
            capabilities,
            sequence_id: 0,
            waiting: VecDeque::new(),
            status: Status::empty(),
            is_tls: false,
            closed: false,
        }
    }

    /// Hand the raw socket to the host's TLS implementation and continue
    /// over the channel it returns, keeping all session state.
    ///
    /// The caller must have flushed the `SSLRequest` packet first.
    pub(crate) async fn upgrade<T>(self, tls: T, config: crate::net::TlsConfig<'_>) -> Result<Self>
    where
        T: crate::net::TlsUpgrade,
    {
        let Self { socket, capabilities, sequence_id, waiting, status, is_tls: _, closed } = self;

        let socket = tls.upgrade(socket.into_inner(), config).await?;

        Ok(Self {
            socket: BufferedSocket::new(socket),
            capabilities,
            sequence_id,
            waiting,
            status,
            is_tls: true,
            closed,
        })
    }

    /// Record `err` against the connection: everything except server errors
    /// and per-column decode failures poisons the session.
    pub(crate) fn note_error(&mut self, err: &Error) {
        if !matches!(err, Error::Database(_) | Error::Decode(_)) {
            self.closed = true;
        }
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.note_error(err);
        }

        result
    }

    /// Serialize a packet into the write buffer without flushing, continuing
    /// the current sequence. Used inside the handshake, where several
    /// packets belong to one counting round.
    pub(crate) fn write_packet<'en, T>(&mut self, payload: T) -> Result<()>
    where
        T: ProtocolEncode<'en, Capabilities>,
    {
        let capabilities = self.capabilities;
        let mut sequence_id = self.sequence_id;

        let result = Packet(payload)
            .encode_with(self.socket.write_buffer_mut(), (capabilities, &mut sequence_id));

        self.sequence_id = sequence_id;

        self.guard(result)
    }

    /// Begin a fresh command: reset the sequence counter, serialize, and
    /// flush.
    pub(crate) async fn send_packet<'en, T>(&mut self, payload: T) -> Result<()>
    where
        T: ProtocolEncode<'en, Capabilities>,
    {
        self.sequence_id = 0;
        self.write_packet(payload)?;
        self.flush().await
    }

    pub(crate) async fn flush(&mut self) -> Result<()> {
        let result = self.socket.flush().await;
        self.guard(result)
    }

    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        self.closed = true;
        self.socket.shutdown().await
    }

    /// Read one frame: header, sequence check, payload.
    async fn recv_frame(&mut self) -> Result<Bytes> {
        let mut header = self.socket.read_exact(4).await?;

        let len = header.get_uint_le(3) as usize;
        let sequence_id = header.get_u8();

        if sequence_id != self.sequence_id {
            return Err(Error::Framing(FramingError::SequenceMismatch {
                expected: self.sequence_id,
                actual: sequence_id,
            }));
        }

        self.sequence_id = sequence_id.wrapping_add(1);

        self.socket.read_exact(len).await
    }

    /// Receive the next logical packet, reassembling split payloads.
    ///
    /// An ERR payload is intercepted here, closes out the pending response
    /// entry, and surfaces as [`Error::Database`].
    pub(crate) async fn recv_packet(&mut self) -> Result<Packet<Bytes>> {
        let result = self.recv_packet_inner().await;
        self.guard(result)
    }

    async fn recv_packet_inner(&mut self) -> Result<Packet<Bytes>> {
        let first = self.recv_frame().await?;

        let payload = if first.len() < MAX_PACKET_PAYLOAD {
            first
        } else {
            let mut joined = BytesMut::with_capacity(first.len() * 2);
            joined.extend_from_slice(&first);

            loop {
                let frame = self.recv_frame().await?;
                let last = frame.len() < MAX_PACKET_PAYLOAD;

                joined.extend_from_slice(&frame);

                if last {
                    break joined.freeze();
                }
            }
        };

        log::trace!("read  < packet len={} tag={:?}", payload.len(), payload.first());

        match payload.first() {
            None => Err(err_protocol!("received an empty packet")),

            Some(0xff) => {
                // surface server errors in one place instead of at every
                // call site; the response this packet ends is over
                self.waiting.pop_front();

                let err = Packet(payload).err(self.capabilities)?;
                Err(err.into())
            }

            Some(_) => Ok(Packet(payload)),
        }
    }

    pub(crate) async fn recv<'de, T>(&mut self) -> Result<T>
    where
        T: ProtocolDecode<'de, Capabilities>,
    {
        let capabilities = self.capabilities;
        let packet = self.recv_packet().await?;
        let result = packet.decode_with(capabilities);

        self.guard(result)
    }

    pub(crate) async fn recv_ok(&mut self) -> Result<OkPacket> {
        let capabilities = self.capabilities;
        let packet = self.recv_packet().await?;
        let result = packet.ok(capabilities);

        let ok = self.guard(result)?;
        self.status = ok.status;

        Ok(ok)
    }

    /// Read the EOF packet that closes a metadata block, unless
    /// `DEPRECATE_EOF` removed it.
    pub(crate) async fn maybe_recv_eof(&mut self) -> Result<Option<EofPacket>> {
        if self.capabilities.contains(Capabilities::DEPRECATE_EOF) {
            return Ok(None);
        }

        let capabilities = self.capabilities;
        let packet = self.recv_packet().await?;
        let result = packet.eof(capabilities);

        let eof = self.guard(result)?;
        self.status = eof.status;

        Ok(Some(eof))
    }

    /// Drain whatever responses are still owed before a new command starts.
    ///
    /// A row stream dropped mid-result leaves its entry in `waiting`; this
    /// reads and discards until the server has nothing more in flight,
    /// making drop-to-cancel safe at command boundaries.
    pub(crate) async fn wait_until_ready(&mut self) -> Result<()> {
        if !self.socket.is_write_buffer_empty() {
            self.flush().await?;
        }

        while !self.waiting.is_empty() {
            while self.waiting.front() == Some(&Waiting::Row) {
                let packet = match self.recv_packet().await {
                    Ok(packet) => packet,

                    Err(Error::Database(err)) => {
                        // an error that ends a result set we are discarding
                        // belongs to the abandoned command, not the next one
                        log::debug!("discarded server error while draining: {err}");
                        continue;
                    }

                    Err(err) => return Err(err),
                };

                if packet[0] == 0xfe && packet.len() < 9 {
                    let capabilities = self.capabilities;
                    let eof = packet.eof(capabilities)?;
                    self.status = eof.status;

                    if eof.status.contains(Status::MORE_RESULTS_EXISTS) {
                        *self.waiting.front_mut().unwrap() = Waiting::Result;
                    } else {
                        self.waiting.pop_front();
                    }
                }
            }

            while self.waiting.front() == Some(&Waiting::Result) {
                let packet = match self.recv_packet().await {
                    Ok(packet) => packet,

                    Err(Error::Database(err)) => {
                        log::debug!("discarded server error while draining: {err}");
                        continue;
                    }

                    Err(err) => return Err(err),
                };

                if packet[0] == 0x00 || (packet[0] == 0xfe && packet.len() < 9) {
                    let capabilities = self.capabilities;

                    self.status = if packet[0] == 0x00 {
                        packet.ok(capabilities)?.status
                    } else {
                        // dispatches on DEPRECATE_EOF internally
                        packet.eof(capabilities)?.status
                    };

                    if !self.status.contains(Status::MORE_RESULTS_EXISTS) {
                        self.waiting.pop_front();
                    }
                } else if packet[0] == 0xfb {
                    // a LOCAL INFILE request from an abandoned query still
                    // has to be refused so the server can finish
                    self.write_packet(&[][..])?;
                    self.flush().await?;
                } else {
                    self.skip_result_metadata(packet).await?;
                    *self.waiting.front_mut().unwrap() = Waiting::Row;
                }
            }
        }

        self.sequence_id = 0;

        Ok(())
    }

    async fn skip_result_metadata(&mut self, packet: Packet<Bytes>) -> Result<()> {
        let mut bytes = packet.0;
        let columns = bytes.get_uint_lenenc()?;

        for _ in 0..columns {
            let _ = self.recv_packet().await?;
        }

        self.maybe_recv_eof().await?;

        Ok(())
    }
}

impl MySqlStream {
    /// Release oversized read/write buffers back to the allocator.
    pub(crate) fn shrink_buffers(&mut self) {
        self.socket.shrink_buffers();
    }
}
