use crate::error::{Error, Result};
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

/// Creates a prepared statement from a query string.
///
/// <https://dev.mysql.com/doc/internals/en/com-stmt-prepare.html>
/// <https://mariadb.com/kb/en/com_stmt_prepare/>
#[derive(Debug)]
pub(crate) struct Prepare<'q> {
    pub(crate) sql: &'q str,
}

impl ProtocolEncode<'_, Capabilities> for Prepare<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<(), Error> {
        buf.push(0x16); // COM_STMT_PREPARE
        buf.extend_from_slice(self.sql.as_bytes());

        Ok(())
    }
}
