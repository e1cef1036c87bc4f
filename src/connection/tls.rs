use crate::connection::stream::MySqlStream;
use crate::error::{Error, Result};
use crate::net::{TlsConfig, TlsUpgrade};
use crate::options::{MySqlConnectOptions, MySqlSslMode};
use crate::protocol::connect::SslRequest;
use crate::protocol::Capabilities;

/// Upgrade the channel to TLS if the options ask for it and the server
/// supports it, sending the `SSLRequest` packet first.
///
/// Runs between receiving the server greeting and sending the handshake
/// response; the response then travels over the encrypted channel.
pub(super) async fn maybe_upgrade<T: TlsUpgrade>(
    mut stream: MySqlStream,
    tls: T,
    options: &MySqlConnectOptions,
) -> Result<MySqlStream> {
    // after the capability intersection, SSL remains set only when both
    // sides offered it
    let server_supports_tls = stream.capabilities.contains(Capabilities::SSL);
    let upgradable = server_supports_tls && tls.is_available();

    match options.ssl_mode {
        MySqlSslMode::Disabled => return Ok(stream),

        MySqlSslMode::Preferred if !upgradable => {
            log::warn!("TLS is unavailable for this connection; continuing without encryption");

            // make sure the handshake response does not claim SSL
            stream.capabilities.remove(Capabilities::SSL);

            return Ok(stream);
        }

        mode if mode.is_required() && !upgradable => {
            stream.closed = true;

            return Err(Error::Tls(
                if server_supports_tls {
                    "connect options require TLS, but no TLS provider was supplied"
                } else {
                    "connect options require TLS, but the server does not support it"
                }
                .into(),
            ));
        }

        _ => {}
    }

    // past this point the upgrade is happening; the SSLRequest packet
    // continues the handshake sequence counter
    stream.write_packet(SslRequest {
        max_packet_size: options.max_packet_size,
        collation: collation_byte(options),
    })?;
    stream.flush().await?;

    let config = TlsConfig {
        server_name: &options.host,
        accept_invalid_certs: !matches!(
            options.ssl_mode,
            MySqlSslMode::VerifyCa | MySqlSslMode::VerifyIdentity
        ),
        accept_invalid_hostnames: options.ssl_mode != MySqlSslMode::VerifyIdentity,
    };

    log::debug!("upgrading connection to TLS (server name {:?})", config.server_name);

    stream.upgrade(tls, config).await
}

pub(super) fn collation_byte(options: &MySqlConnectOptions) -> u8 {
    // the handshake carries only the low byte of the collation id; ids
    // above 255 (e.g. utf8mb4_0900_ai_ci) fall back to utf8mb4_general_ci
    // here and are expected to be set with a follow-up SET NAMES
    let id = options.collation.0;

    if id > 0xff {
        crate::collation::Collation::UTF8MB4_GENERAL_CI.0 as u8
    } else {
        id as u8
    }
}
