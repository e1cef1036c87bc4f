use crate::error::{Error, Result};
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

/// Asks the server to switch the channel to TLS before authentication.
///
/// Wire-identical to the fixed 32-byte prefix of
/// [`HandshakeResponse`][super::HandshakeResponse]; the full response is sent
/// again over the encrypted channel once the upgrade completes.
///
/// <https://dev.mysql.com/doc/internals/en/connection-phase-packets.html#packet-Protocol::SSLRequest>
#[derive(Debug)]
pub(crate) struct SslRequest {
    pub(crate) max_packet_size: u32,
    pub(crate) collation: u8,
}

impl ProtocolEncode<'_, Capabilities> for SslRequest {
    fn encode_with(&self, buf: &mut Vec<u8>, context: Capabilities) -> Result<(), Error> {
        // capability flags : int<4>
        buf.extend_from_slice(&(context.bits() as u32).to_le_bytes());

        // max packet size : int<4>
        buf.extend_from_slice(&self.max_packet_size.to_le_bytes());

        // connection default collation : int<1>
        buf.push(self.collation);

        // reserved : string<23>
        buf.extend_from_slice(&[0_u8; 23]);

        Ok(())
    }
}
