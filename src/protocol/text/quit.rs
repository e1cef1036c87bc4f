use crate::error::{Error, Result};
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

/// Announces that the client is disconnecting. The server answers by
/// closing the channel; no response packet follows.
///
/// <https://dev.mysql.com/doc/internals/en/com-quit.html>
#[derive(Debug)]
pub(crate) struct Quit;

impl ProtocolEncode<'_, Capabilities> for Quit {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<(), Error> {
        buf.push(0x01); // COM_QUIT

        Ok(())
    }
}
