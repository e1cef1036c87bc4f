use std::ops::Deref;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::io::{ProtocolDecode, ProtocolEncode};
use crate::protocol::response::{EofPacket, ErrPacket, OkPacket};
use crate::protocol::Capabilities;

/// Payloads of this size and above are split across multiple frames.
pub(crate) const MAX_PACKET_PAYLOAD: usize = 0xff_ffff;

/// One logical protocol packet: a payload plus the framing applied to it.
///
/// On encode, wraps any message and emits the `[len:3][seq:1]` header, slicing
/// the payload into 2^24-1 byte frames with consecutive sequence numbers. A
/// payload whose length is an exact multiple of the limit (including the empty
/// payload) gains a trailing empty frame so the receiver can find the end.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_packets.html>
pub(crate) struct Packet<T>(pub(crate) T);

impl<'en, 'stream, T> ProtocolEncode<'stream, (Capabilities, &'stream mut u8)> for Packet<T>
where
    T: ProtocolEncode<'en, Capabilities>,
{
    fn encode_with(
        &self,
        buf: &mut Vec<u8>,
        (capabilities, sequence_id): (Capabilities, &'stream mut u8),
    ) -> Result<(), Error> {
        let mut payload = Vec::with_capacity(32);
        self.0.encode_with(&mut payload, capabilities)?;

        let mut offset = 0;

        loop {
            let chunk = &payload[offset..(offset + MAX_PACKET_PAYLOAD).min(payload.len())];

            let mut header = [0_u8; 4];
            LittleEndian::write_u24(&mut header, chunk.len() as u32);
            header[3] = *sequence_id;
            *sequence_id = sequence_id.wrapping_add(1);

            buf.extend_from_slice(&header);
            buf.extend_from_slice(chunk);

            offset += chunk.len();

            // a short (possibly empty) frame terminates the packet
            if chunk.len() < MAX_PACKET_PAYLOAD {
                return Ok(());
            }
        }
    }
}

impl Packet<Bytes> {
    pub(crate) fn decode_with<'de, T, C>(self, context: C) -> Result<T>
    where
        T: ProtocolDecode<'de, C>,
    {
        T::decode_with(self.0, context)
    }

    pub(crate) fn ok(self, capabilities: Capabilities) -> Result<OkPacket> {
        self.decode_with(capabilities)
    }

    pub(crate) fn eof(self, capabilities: Capabilities) -> Result<EofPacket> {
        if capabilities.contains(Capabilities::DEPRECATE_EOF) {
            // under DEPRECATE_EOF the server sends an OK-shaped packet
            // with the 0xfe tag where a legacy EOF would appear
            let ok = self.ok(capabilities)?;

            Ok(EofPacket { warnings: ok.warnings, status: ok.status })
        } else {
            self.decode_with(capabilities)
        }
    }

    pub(crate) fn err(self, capabilities: Capabilities) -> Result<ErrPacket> {
        self.decode_with(capabilities)
    }
}

impl Deref for Packet<Bytes> {
    type Target = Bytes;

    fn deref(&self) -> &Bytes {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Packet, MAX_PACKET_PAYLOAD};
    use crate::io::ProtocolEncode;
    use crate::protocol::Capabilities;

    fn encode(payload: &[u8], sequence_id: &mut u8) -> Vec<u8> {
        let mut buf = Vec::new();

        Packet(payload)
            .encode_with(&mut buf, (Capabilities::empty(), sequence_id))
            .unwrap();

        buf
    }

    #[test]
    fn small_payload_is_a_single_frame() {
        let mut sequence_id = 0;
        let buf = encode(&[0x0e], &mut sequence_id);

        assert_eq!(buf, &[0x01, 0x00, 0x00, 0x00, 0x0e]);
        assert_eq!(sequence_id, 1);
    }

    #[test]
    fn empty_payload_is_a_single_empty_frame() {
        let mut sequence_id = 3;
        let buf = encode(&[], &mut sequence_id);

        assert_eq!(buf, &[0x00, 0x00, 0x00, 0x03]);
        assert_eq!(sequence_id, 4);
    }

    #[test]
    fn oversized_payload_is_split() {
        let payload = vec![0xab_u8; MAX_PACKET_PAYLOAD + 1];

        let mut sequence_id = 0;
        let buf = encode(&payload, &mut sequence_id);

        // frame 1: full, seq 0
        assert_eq!(&buf[..4], &[0xff, 0xff, 0xff, 0x00]);

        // frame 2: one byte, seq 1
        let tail = &buf[4 + MAX_PACKET_PAYLOAD..];
        assert_eq!(tail, &[0x01, 0x00, 0x00, 0x01, 0xab]);

        assert_eq!(sequence_id, 2);
    }

    // a payload of exactly k * (2^24 - 1) bytes yields k full frames plus a
    // zero-length terminator
    #[test]
    fn exact_multiple_gains_empty_trailer() {
        let payload = vec![0_u8; MAX_PACKET_PAYLOAD];

        let mut sequence_id = 0;
        let buf = encode(&payload, &mut sequence_id);

        assert_eq!(buf.len(), 4 + MAX_PACKET_PAYLOAD + 4);
        assert_eq!(&buf[4 + MAX_PACKET_PAYLOAD..], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(sequence_id, 2);
    }

    #[test]
    fn sequence_id_wraps() {
        let mut sequence_id = 0xff;
        let buf = encode(&[0x01], &mut sequence_id);

        assert_eq!(buf[3], 0xff);
        assert_eq!(sequence_id, 0);
    }
}
