use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Result};
use crate::io::{BufExt, ProtocolDecode};
use crate::protocol::Capabilities;

/// Signals that a command failed or that the connection must end.
///
/// <https://dev.mysql.com/doc/internals/en/packet-ERR_Packet.html>
/// <https://mariadb.com/kb/en/err_packet/>
#[derive(Debug)]
pub(crate) struct ErrPacket {
    pub(crate) error_code: u16,
    pub(crate) sql_state: Option<String>,
    pub(crate) error_message: String,
}

impl ProtocolDecode<'_, Capabilities> for ErrPacket {
    fn decode_with(mut buf: Bytes, capabilities: Capabilities) -> Result<Self> {
        if buf.is_empty() {
            return Err(err_protocol!("empty packet where ERR was expected"));
        }

        let tag = buf.get_u8();
        if tag != 0xff {
            return Err(err_protocol!("expected ERR (0xff), got 0x{tag:02x}"));
        }

        let error_code = buf.get_u16_le();

        let sql_state = if capabilities.contains(Capabilities::PROTOCOL_41)
            && buf.first() == Some(&b'#')
        {
            buf.advance(1);
            Some(buf.get_str(5)?)
        } else {
            None
        };

        let error_message = buf.get_str_eof()?;

        Ok(Self { error_code, sql_state, error_message })
    }
}
