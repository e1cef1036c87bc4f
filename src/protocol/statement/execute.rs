use crate::error::{Error, Result};
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;
use crate::value::MySqlValue;

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/mysql__com_8h.html#a3e5e9e744ff6f7b989a604fd669977da
const CURSOR_TYPE_NO_CURSOR: u8 = 0x00;

/// Executes a prepared statement with a set of parameter values.
///
/// NULL parameters are flagged in a bitmap ahead of the value block; every
/// parameter re-declares its type on each execution ("new params bound"),
/// since prepared-statement parameters have no server-known types until then.
///
/// <https://dev.mysql.com/doc/internals/en/com-stmt-execute.html>
/// <https://mariadb.com/kb/en/com_stmt_execute/>
#[derive(Debug)]
pub(crate) struct Execute<'q> {
    pub(crate) statement_id: u32,
    pub(crate) params: &'q [MySqlValue],
}

impl ProtocolEncode<'_, Capabilities> for Execute<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<(), Error> {
        buf.push(0x17); // COM_STMT_EXECUTE
        buf.extend_from_slice(&self.statement_id.to_le_bytes());
        buf.push(CURSOR_TYPE_NO_CURSOR);

        // iteration count : int<4>, always 1
        buf.extend_from_slice(&1_u32.to_le_bytes());

        if self.params.is_empty() {
            return Ok(());
        }

        // NULL bitmap : byte<(params + 7) / 8>
        let bitmap_offset = buf.len();
        buf.resize(buf.len() + (self.params.len() + 7) / 8, 0);

        for (i, value) in self.params.iter().enumerate() {
            if value.is_null() {
                buf[bitmap_offset + i / 8] |= 1 << (i % 8);
            }
        }

        // new params bound : int<1>
        buf.push(0x01);

        for value in self.params {
            let (ty, unsigned) = value.param_type();

            buf.push(ty as u8);
            buf.push(if unsigned { 0x80 } else { 0x00 });
        }

        for value in self.params {
            value.encode_binary(buf);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Execute;
    use crate::io::ProtocolEncode;
    use crate::protocol::Capabilities;
    use crate::value::MySqlValue;

    #[test]
    fn encodes_null_and_int_params() {
        let params = [MySqlValue::Null, MySqlValue::Int32(7)];

        let mut buf = Vec::new();
        Execute { statement_id: 1, params: &params }
            .encode_with(&mut buf, Capabilities::empty())
            .unwrap();

        assert_eq!(
            buf,
            &[
                0x17, // COM_STMT_EXECUTE
                0x01, 0x00, 0x00, 0x00, // statement id
                0x00, // no cursor
                0x01, 0x00, 0x00, 0x00, // iteration count
                0x01, // NULL bitmap: param 0 is NULL
                0x01, // new params bound
                0x06, 0x00, // NULL
                0x03, 0x00, // LONG
                0x07, 0x00, 0x00, 0x00, // 7
            ]
        );
    }

    #[test]
    fn encodes_unsigned_flag_in_type_block() {
        let params = [MySqlValue::UInt64(u64::MAX)];

        let mut buf = Vec::new();
        Execute { statement_id: 2, params: &params }
            .encode_with(&mut buf, Capabilities::empty())
            .unwrap();

        // type block: LONGLONG with the unsigned flag
        assert_eq!(&buf[12..14], &[0x08, 0x80]);
        assert_eq!(&buf[14..], &[0xff; 8]);
    }

    #[test]
    fn no_parameter_block_without_parameters() {
        let mut buf = Vec::new();
        Execute { statement_id: 3, params: &[] }
            .encode_with(&mut buf, Capabilities::empty())
            .unwrap();

        assert_eq!(buf.len(), 10);
    }
}
