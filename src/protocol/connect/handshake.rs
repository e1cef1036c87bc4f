use bytes::{Buf, Bytes, BytesMut};

use crate::error::{err_protocol, Result};
use crate::io::{BufExt, ProtocolDecode};
use crate::protocol::response::Status;
use crate::protocol::{AuthPlugin, Capabilities};

/// The server greeting: protocol version 10, the server's capabilities, the
/// 20-byte authentication scramble (split across two fields for historical
/// reasons), and the name of its preferred authentication plugin.
///
/// Servers old enough to speak only the 3.20 handshake announce a different
/// protocol version and are rejected outright.
///
/// <https://dev.mysql.com/doc/internals/en/connection-phase-packets.html#packet-Protocol::Handshake>
/// <https://mariadb.com/kb/en/connection/#initial-handshake-packet>
#[derive(Debug)]
pub(crate) struct Handshake {
    pub(crate) server_version: String,
    pub(crate) connection_id: u32,
    pub(crate) server_capabilities: Capabilities,
    pub(crate) server_default_collation: u8,
    pub(crate) status: Status,
    pub(crate) auth_plugin: AuthPlugin,
    pub(crate) scramble: Bytes,
}

impl ProtocolDecode<'_> for Handshake {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        let protocol_version = buf.get_u8();
        if protocol_version != 10 {
            return Err(err_protocol!(
                "unsupported handshake protocol version {protocol_version}; \
                 this client requires protocol version 10"
            ));
        }

        let server_version = buf.get_str_nul()?;
        let connection_id = buf.get_u32_le();

        // scramble, part 1 : string<8>
        let scramble_1 = buf.get_bytes(8)?;

        // filler : int<1>
        buf.advance(1);

        // capabilities, low 16 bits : int<2>
        let capabilities_lo = buf.get_u16_le();
        let mut server_capabilities =
            Capabilities::from_bits_truncate(u64::from(capabilities_lo));

        let server_default_collation = buf.get_u8();
        let status = Status::from_bits_truncate(buf.get_u16_le());

        // capabilities, high 16 bits : int<2>
        let capabilities_hi = buf.get_u16_le();
        server_capabilities |=
            Capabilities::from_bits_truncate(u64::from(capabilities_hi) << 16);

        // length of the full scramble : int<1>
        let scramble_len = if server_capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.get_u8()
        } else {
            buf.advance(1);
            0
        };

        // reserved : string<10>
        buf.advance(10);

        let mut scramble = BytesMut::from(&scramble_1[..]);

        if server_capabilities.contains(Capabilities::SECURE_CONNECTION) {
            // scramble, part 2 : string<max(12, scramble_len - 9)>
            let len = usize::from(scramble_len.saturating_sub(9)).max(12);
            scramble.extend_from_slice(&buf.get_bytes(len)?);

            // NUL terminator of the scramble : int<1>
            buf.advance(1);
        }

        let auth_plugin = if server_capabilities.contains(Capabilities::PLUGIN_AUTH) {
            AuthPlugin::parse(&buf.get_str_nul()?)?
        } else {
            AuthPlugin::MySqlNativePassword
        };

        Ok(Self {
            server_version,
            connection_id,
            server_capabilities,
            server_default_collation,
            status,
            auth_plugin,
            scramble: scramble.freeze(),
        })
    }
}
