use crate::error::{Error, Result};
use crate::io::{BufMutExt, ProtocolEncode};
use crate::protocol::connect::SslRequest;
use crate::protocol::{AuthPlugin, Capabilities};

/// The client's answer to the server greeting: the effective capability set,
/// the login name, the hashed authentication response, and optionally the
/// default schema and the plugin the response was computed with.
///
/// <https://dev.mysql.com/doc/internals/en/connection-phase-packets.html#packet-Protocol::HandshakeResponse>
/// <https://mariadb.com/kb/en/connection/#client-handshake-response>
#[derive(Debug)]
pub(crate) struct HandshakeResponse<'a> {
    pub(crate) max_packet_size: u32,
    pub(crate) collation: u8,
    pub(crate) username: &'a str,
    pub(crate) database: Option<&'a str>,
    pub(crate) auth_plugin: AuthPlugin,
    pub(crate) auth_response: &'a [u8],
}

impl ProtocolEncode<'_, Capabilities> for HandshakeResponse<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, context: Capabilities) -> Result<(), Error> {
        // the connection refuses to negotiate these up front; reaching this
        // point with either set is a bug in the capability intersection
        if context
            .intersects(Capabilities::CONNECT_ATTRS | Capabilities::PLUGIN_AUTH_LENENC_DATA)
        {
            return Err(Error::Configuration(
                "CONNECT_ATTRS and PLUGIN_AUTH_LENENC_CLIENT_DATA \
                 are not supported by this client"
                    .into(),
            ));
        }

        // the first 32 bytes are shared with the SSLRequest packet
        SslRequest { max_packet_size: self.max_packet_size, collation: self.collation }
            .encode_with(buf, context)?;

        buf.put_str_nul(self.username);

        if context.contains(Capabilities::SECURE_CONNECTION) {
            let len = u8::try_from(self.auth_response.len()).map_err(|_| {
                Error::Configuration("authentication response longer than 255 bytes".into())
            })?;

            buf.push(len);
            buf.extend_from_slice(self.auth_response);
        } else {
            // pre-4.1 servers expect a NUL-terminated response; we never get
            // here because SECURE_CONNECTION is mandatory
            buf.extend_from_slice(self.auth_response);
            buf.push(0);
        }

        if context.contains(Capabilities::CONNECT_WITH_DB) {
            if let Some(database) = self.database {
                buf.put_str_nul(database);
            } else {
                buf.push(0);
            }
        }

        if context.contains(Capabilities::PLUGIN_AUTH) {
            buf.put_str_nul(self.auth_plugin.name());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthPlugin, Capabilities, HandshakeResponse};
    use crate::io::ProtocolEncode;

    fn capabilities() -> Capabilities {
        Capabilities::LONG_PASSWORD
            | Capabilities::FOUND_ROWS
            | Capabilities::LONG_FLAG
            | Capabilities::CONNECT_WITH_DB
            | Capabilities::PROTOCOL_41
            | Capabilities::INTERACTIVE
            | Capabilities::TRANSACTIONS
            | Capabilities::SECURE_CONNECTION
            | Capabilities::MULTI_STATEMENTS
            | Capabilities::MULTI_RESULTS
            | Capabilities::PS_MULTI_RESULTS
            | Capabilities::PLUGIN_AUTH
            | Capabilities::SESSION_TRACK
    }

    #[test]
    fn encodes_native_password_response() {
        let auth_response = [0xaa_u8; 20];

        let mut buf = Vec::new();
        HandshakeResponse {
            max_packet_size: 0x0100_0000,
            collation: 0x21,
            username: "test_username",
            database: Some("test_database"),
            auth_plugin: AuthPlugin::MySqlNativePassword,
            auth_response: &auth_response,
        }
        .encode_with(&mut buf, capabilities())
        .unwrap();

        // capability flags, little-endian
        assert_eq!(&buf[..4], &[0x0f, 0xa6, 0x8f, 0x00]);

        // max packet size and collation
        assert_eq!(&buf[4..8], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(buf[8], 0x21);

        // 23 reserved zero bytes
        assert!(buf[9..32].iter().all(|&b| b == 0));

        assert_eq!(&buf[32..46], b"test_username\0");

        // length-prefixed auth response
        assert_eq!(buf[46], 0x14);
        assert_eq!(&buf[47..67], &auth_response);

        assert_eq!(&buf[67..81], b"test_database\0");
        assert_eq!(&buf[81..], b"mysql_native_password\0");
    }

    #[test]
    fn refuses_unsupported_capabilities() {
        let mut buf = Vec::new();

        let result = HandshakeResponse {
            max_packet_size: 0x0100_0000,
            collation: 0x21,
            username: "root",
            database: None,
            auth_plugin: AuthPlugin::MySqlNativePassword,
            auth_response: &[],
        }
        .encode_with(&mut buf, capabilities() | Capabilities::CONNECT_ATTRS);

        assert!(matches!(result, Err(crate::Error::Configuration(_))));
    }
}
