use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Result};
use crate::io::ProtocolDecode;
use crate::protocol::response::Status;
use crate::protocol::Capabilities;

/// Legacy marker for the end of a column-definition or row sequence.
///
/// Only sent when `DEPRECATE_EOF` was not negotiated; identified by the tag
/// `0xfe` and a packet shorter than 9 bytes (a longer `0xfe` packet would be
/// a length-encoded integer in row data).
///
/// <https://dev.mysql.com/doc/internals/en/packet-EOF_Packet.html>
#[derive(Debug)]
pub(crate) struct EofPacket {
    pub(crate) warnings: u16,
    pub(crate) status: Status,
}

impl ProtocolDecode<'_, Capabilities> for EofPacket {
    fn decode_with(mut buf: Bytes, capabilities: Capabilities) -> Result<Self> {
        if buf.is_empty() {
            return Err(err_protocol!("empty packet where EOF was expected"));
        }

        let tag = buf.get_u8();
        if tag != 0xfe {
            return Err(err_protocol!("expected EOF (0xfe), got 0x{tag:02x}"));
        }

        let (warnings, status) = if capabilities.contains(Capabilities::PROTOCOL_41) {
            let warnings = buf.get_u16_le();
            let status = Status::from_bits_truncate(buf.get_u16_le());

            (warnings, status)
        } else {
            (0, Status::empty())
        };

        Ok(Self { warnings, status })
    }
}
