use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Result};
use crate::io::{BufExt, ProtocolDecode};
use crate::protocol::AuthPlugin;

/// The server's demand that authentication restart with a different plugin
/// and a fresh scramble.
///
/// <https://dev.mysql.com/doc/internals/en/connection-phase-packets.html#packet-Protocol::AuthSwitchRequest>
#[derive(Debug)]
pub(crate) struct AuthSwitchRequest {
    pub(crate) plugin: AuthPlugin,
    pub(crate) scramble: Bytes,
}

impl ProtocolDecode<'_> for AuthSwitchRequest {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        let tag = buf.get_u8();
        if tag != 0xfe {
            return Err(err_protocol!("expected AuthSwitchRequest (0xfe), got 0x{tag:02x}"));
        }

        let plugin = AuthPlugin::parse(&buf.get_str_nul()?)?;

        // the scramble is the rest of the packet, minus a trailing NUL if any
        let mut scramble = buf;
        if scramble.last() == Some(&0) {
            scramble.truncate(scramble.len() - 1);
        }

        Ok(Self { plugin, scramble })
    }
}
