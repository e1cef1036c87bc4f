use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Result};
use crate::io::{BufExt, MySqlBufExt, ProtocolDecode};
use crate::protocol::response::Status;
use crate::protocol::Capabilities;

/// Signals successful completion of a command.
///
/// Since MySQL 5.7.5 (capability `DEPRECATE_EOF`), OK packets tagged `0xfe`
/// also stand in for the legacy EOF packet.
///
/// <https://dev.mysql.com/doc/internals/en/packet-OK_Packet.html>
/// <https://mariadb.com/kb/en/ok_packet/>
#[derive(Debug)]
pub(crate) struct OkPacket {
    pub(crate) affected_rows: u64,
    pub(crate) last_insert_id: u64,
    pub(crate) status: Status,
    pub(crate) warnings: u16,

    /// Human-readable status information.
    #[allow(dead_code)]
    pub(crate) info: String,
}

impl ProtocolDecode<'_, Capabilities> for OkPacket {
    fn decode_with(mut buf: Bytes, capabilities: Capabilities) -> Result<Self> {
        if buf.is_empty() {
            return Err(err_protocol!("empty packet where OK was expected"));
        }

        let tag = buf.get_u8();
        if tag != 0x00 && tag != 0xfe {
            return Err(err_protocol!("expected OK (0x00 or 0xfe), got 0x{tag:02x}"));
        }

        let affected_rows = buf.get_uint_lenenc()?;
        let last_insert_id = buf.get_uint_lenenc()?;

        let status =
            if capabilities.intersects(Capabilities::PROTOCOL_41 | Capabilities::TRANSACTIONS) {
                Status::from_bits_truncate(buf.get_u16_le())
            } else {
                Status::empty()
            };

        let warnings = if capabilities.contains(Capabilities::PROTOCOL_41) {
            buf.get_u16_le()
        } else {
            0
        };

        let info = if buf.is_empty() {
            String::new()
        } else if capabilities.contains(Capabilities::SESSION_TRACK) {
            // under SESSION_TRACK the info string is length-encoded and may
            // be followed by state-change data, which we do not interpret
            buf.get_str_lenenc()?
        } else {
            buf.get_str_eof()?
        };

        Ok(Self { affected_rows, last_insert_id, status, warnings, info })
    }
}
