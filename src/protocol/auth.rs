use crate::error::{AuthError, Error, Result};

/// The authentication plugins this client can answer.
///
/// <https://dev.mysql.com/doc/internals/en/authentication-method.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthPlugin {
    /// SHA-1 challenge/response; the default before MySQL 8.0.
    MySqlNativePassword,

    /// SHA-256 challenge/response with a server-side cache; the default
    /// since MySQL 8.0. Falls back to an RSA-encrypted (or TLS-protected
    /// cleartext) password when the cache misses.
    CachingSha2Password,

    /// Cleartext password; permitted over TLS only.
    MySqlClearPassword,
}

impl AuthPlugin {
    pub(crate) fn parse(name: &str) -> Result<Self> {
        match name {
            "mysql_native_password" => Ok(AuthPlugin::MySqlNativePassword),
            "caching_sha2_password" => Ok(AuthPlugin::CachingSha2Password),
            "mysql_clear_password" => Ok(AuthPlugin::MySqlClearPassword),

            _ => Err(Error::Auth(AuthError::UnknownPlugin(name.to_owned()))),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => "mysql_native_password",
            AuthPlugin::CachingSha2Password => "caching_sha2_password",
            AuthPlugin::MySqlClearPassword => "mysql_clear_password",
        }
    }
}
