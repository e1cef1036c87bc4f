use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Result};
use crate::io::ProtocolDecode;
use crate::protocol::Capabilities;

/// The leading packet of a successful `COM_STMT_PREPARE` response; followed
/// by `params` parameter definitions and `columns` column definitions, each
/// group closed by EOF unless `DEPRECATE_EOF` was negotiated.
///
/// <https://dev.mysql.com/doc/internals/en/com-stmt-prepare-response.html#packet-COM_STMT_PREPARE_OK>
#[derive(Debug)]
pub(crate) struct PrepareOk {
    pub(crate) statement_id: u32,
    pub(crate) columns: u16,
    pub(crate) params: u16,
    pub(crate) warnings: u16,
}

impl ProtocolDecode<'_, Capabilities> for PrepareOk {
    fn decode_with(mut buf: Bytes, _: Capabilities) -> Result<Self> {
        let tag = buf.get_u8();
        if tag != 0x00 {
            return Err(err_protocol!("expected COM_STMT_PREPARE OK (0x00), got 0x{tag:02x}"));
        }

        let statement_id = buf.get_u32_le();
        let columns = buf.get_u16_le();
        let params = buf.get_u16_le();

        // reserved : int<1>
        buf.advance(1);

        let warnings = buf.get_u16_le();

        Ok(Self { statement_id, columns, params, warnings })
    }
}
