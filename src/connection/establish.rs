use bytes::Bytes;

use crate::connection::stream::MySqlStream;
use crate::connection::{auth, tls, MySqlConnection};
use crate::error::{err_protocol, AuthError, Error, Result};
use crate::net::{Socket, TlsUpgrade};
use crate::options::MySqlConnectOptions;
use crate::protocol::connect::{AuthSwitchRequest, Handshake, HandshakeResponse};
use crate::protocol::{AuthPlugin, Capabilities};

// https://dev.mysql.com/doc/internals/en/connection-phase.html
//
// the connection phase:
//  - exchange the capabilities of client and server
//  - upgrade to TLS if requested
//  - authenticate, possibly over several rounds (plugin switch, extra data)

impl MySqlConnection {
    /// Open a session over an established byte channel.
    ///
    /// Drives the server greeting, capability negotiation, the optional TLS
    /// upgrade through `tls`, and authentication; returns once the server
    /// has accepted the login.
    ///
    /// Use [`NoTls`][crate::NoTls] for `tls` when encryption is not wanted
    /// (with [`MySqlSslMode::Disabled`][crate::MySqlSslMode::Disabled] or
    /// `Preferred`).
    pub async fn connect_with<S, T>(
        socket: S,
        tls: T,
        options: &MySqlConnectOptions,
    ) -> Result<Self>
    where
        S: Socket,
        T: TlsUpgrade,
    {
        if options
            .extra_capabilities
            .intersects(Capabilities::CONNECT_ATTRS | Capabilities::PLUGIN_AUTH_LENENC_DATA)
        {
            return Err(Error::Configuration(
                "CONNECT_ATTRS and PLUGIN_AUTH_LENENC_CLIENT_DATA \
                 are not supported by this client"
                    .into(),
            ));
        }

        let mut stream = MySqlStream::new(Box::new(socket), options);

        // the server speaks first; an ERR here (e.g. host blocked) surfaces
        // as a database error and the connection never comes up
        let handshake: Handshake = stream.recv_packet().await?.decode_with(())?;

        let server_capabilities = handshake.server_capabilities;

        for required in [
            Capabilities::PROTOCOL_41,
            Capabilities::SECURE_CONNECTION,
            Capabilities::PLUGIN_AUTH,
        ] {
            if !server_capabilities.contains(required) {
                return Err(err_protocol!(
                    "server is missing the required capability {required:?}"
                ));
            }
        }

        // everything after this speaks only the intersection
        stream.capabilities &= server_capabilities;
        stream.status = handshake.status;

        log::debug!(
            "connected to server {:?} (connection id {}, plugin {}, collation {})",
            handshake.server_version,
            handshake.connection_id,
            handshake.auth_plugin.name(),
            handshake.server_default_collation,
        );

        let mut stream = tls::maybe_upgrade(stream, tls, options).await?;

        let password = options.password.as_deref().unwrap_or_default();
        let mut plugin = handshake.auth_plugin;
        let mut scramble = handshake.scramble.clone();

        let auth_response =
            plugin.scramble(password, &scramble, stream.is_tls).map_err(|err| {
                stream.note_error(&err);
                err
            })?;

        stream.write_packet(HandshakeResponse {
            max_packet_size: options.max_packet_size,
            collation: tls::collation_byte(options),
            username: &options.username,
            database: options.database.as_deref(),
            auth_plugin: plugin,
            auth_response: &auth_response,
        })?;
        stream.flush().await?;

        loop {
            let packet = match stream.recv_packet().await {
                Ok(packet) => packet,

                Err(err) => {
                    // during the connection phase, server errors are fatal
                    stream.closed = true;
                    return Err(err);
                }
            };

            match packet[0] {
                0x00 => {
                    let capabilities = stream.capabilities;
                    let ok = packet.ok(capabilities)?;
                    stream.status = ok.status;

                    break;
                }

                // the server wants authentication redone with another
                // plugin and a fresh scramble
                0xfe => {
                    let switch: AuthSwitchRequest = packet.decode_with(())?;

                    plugin = switch.plugin;
                    scramble = switch.scramble;

                    let response = plugin.scramble(password, &scramble, stream.is_tls)?;

                    stream.write_packet(&*response)?;
                    stream.flush().await?;
                }

                // extra data for the active plugin
                0x01 => {
                    handle_auth_more_data(&mut stream, plugin, password, &scramble, &packet[1..])
                        .await?;
                }

                tag => {
                    stream.closed = true;

                    return Err(err_protocol!(
                        "unexpected packet 0x{tag:02x} during authentication"
                    ));
                }
            }
        }

        // authentication done; the next command starts a fresh sequence
        stream.sequence_id = 0;

        Ok(Self {
            stream,
            connection_id: handshake.connection_id,
            server_version: parse_server_version(&handshake.server_version),
            server_version_raw: handshake.server_version,
            statements: hashbrown::HashMap::new(),
            last_result: None,
        })
    }
}

async fn handle_auth_more_data(
    stream: &mut MySqlStream,
    plugin: AuthPlugin,
    password: &str,
    scramble: &Bytes,
    data: &[u8],
) -> Result<()> {
    match plugin {
        AuthPlugin::CachingSha2Password => match data.first().copied() {
            Some(auth::SHA2_FAST_AUTH_OK) => {
                // the server found the login in its cache; OK is next
                Ok(())
            }

            Some(auth::SHA2_FULL_AUTH) => {
                if stream.is_tls {
                    // the channel is already encrypted; the password can
                    // travel in the clear
                    stream.write_packet(&*auth::to_asciz(password))?;
                    stream.flush().await?;

                    return Ok(());
                }

                // ask for the server's RSA public key
                stream.write_packet(&[auth::SHA2_REQUEST_PUBLIC_KEY][..])?;
                stream.flush().await?;

                let packet = stream.recv_packet().await?;
                if packet[0] != 0x01 {
                    stream.closed = true;

                    return Err(Error::Auth(AuthError::MalformedAuthData(
                        "expected the server's RSA public key",
                    )));
                }

                let encrypted = auth::encrypt_rsa(&packet[1..], password, scramble)?;

                stream.write_packet(&*encrypted)?;
                stream.flush().await?;

                Ok(())
            }

            _ => {
                stream.closed = true;

                Err(Error::Auth(AuthError::MalformedAuthData(
                    "expected fast-auth (0x03) or full-auth (0x04)",
                )))
            }
        },

        _ => {
            stream.closed = true;

            Err(err_protocol!(
                "unexpected extra authentication data for plugin {:?}",
                plugin.name()
            ))
        }
    }
}

// "8.0.30-debug" -> (8, 0, 30); unparseable segments read as zero
fn parse_server_version(version: &str) -> (u16, u16, u16) {
    let mut parts = version
        .split('-')
        .next()
        .unwrap_or_default()
        .splitn(3, '.')
        .map(|part| part.parse::<u16>().unwrap_or(0));

    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);

    (major, minor, patch)
}
