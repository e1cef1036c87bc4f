use std::future::Future;

use crate::error::{Error, Result};
use crate::net::Socket;

/// Parameters the host needs to perform a TLS handshake on our behalf.
///
/// Derived from [`MySqlSslMode`][crate::MySqlSslMode]: `Required` and below
/// accept any certificate, `VerifyCa` checks the chain but not the host name,
/// and `VerifyIdentity` checks both.
#[derive(Debug, Clone, Copy)]
pub struct TlsConfig<'a> {
    /// Server name for SNI and (when verified) host-name matching.
    pub server_name: &'a str,

    pub accept_invalid_certs: bool,
    pub accept_invalid_hostnames: bool,
}

/// The host-supplied half of the STARTTLS-style upgrade.
///
/// After the core has sent the `SSLRequest` packet over the plaintext
/// channel, it hands the raw socket to this trait and continues the handshake
/// over whatever channel comes back.
pub trait TlsUpgrade: Send + Sized {
    /// Whether this upgrader can actually produce a TLS channel.
    ///
    /// With [`MySqlSslMode::Preferred`][crate::MySqlSslMode::Preferred] an
    /// unavailable upgrader downgrades the connection to plaintext instead
    /// of failing it.
    fn is_available(&self) -> bool {
        true
    }

    fn upgrade(
        self,
        socket: Box<dyn Socket>,
        config: TlsConfig<'_>,
    ) -> impl Future<Output = Result<Box<dyn Socket>>> + Send;
}

/// A [`TlsUpgrade`] for hosts that do not support TLS.
///
/// Connecting with an [`MySqlSslMode`][crate::MySqlSslMode] that requires
/// encryption fails with a TLS error; `Preferred` silently downgrades.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTls;

impl TlsUpgrade for NoTls {
    fn is_available(&self) -> bool {
        false
    }

    async fn upgrade(
        self,
        _socket: Box<dyn Socket>,
        _config: TlsConfig<'_>,
    ) -> Result<Box<dyn Socket>> {
        Err(Error::Tls(
            "TLS upgrade requested by the connect options, \
             but no TLS provider was supplied"
                .into(),
        ))
    }
}
