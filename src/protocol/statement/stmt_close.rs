use crate::error::{Error, Result};
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

/// Deallocates a prepared statement on the server. Fire-and-forget: the
/// server sends no response.
///
/// <https://dev.mysql.com/doc/internals/en/com-stmt-close.html>
#[derive(Debug)]
pub(crate) struct StmtClose {
    pub(crate) statement: u32,
}

impl ProtocolEncode<'_, Capabilities> for StmtClose {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<(), Error> {
        buf.push(0x19); // COM_STMT_CLOSE
        buf.extend_from_slice(&self.statement.to_le_bytes());

        Ok(())
    }
}
