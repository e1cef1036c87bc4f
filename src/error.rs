use std::borrow::Cow;
use std::io;

use crate::protocol::response::ErrPacket;

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All the ways a connection can fail.
///
/// Variants are split along the protocol's own fault lines: server-reported
/// errors ([`Error::Database`]) and per-column decode errors ([`Error::Decode`])
/// leave the connection usable; everything else is fatal and moves the
/// connection to the closed state, after which every operation returns
/// [`Error::Closed`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error communicating with the underlying byte channel.
    #[error("error communicating with the server: {0}")]
    Io(#[from] io::Error),

    /// Error occurred while attempting to upgrade the connection to TLS.
    #[error("error during TLS upgrade: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Unprocessable configuration was given to [`connect_with`][crate::MySqlConnection::connect_with].
    #[error("configuration error: {0}")]
    Configuration(Cow<'static, str>),

    /// The server sent bytes this client could not make sense of for the
    /// current protocol phase.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The packet framing layer lost synchronization with the server.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// Authentication against the server failed before it could complete.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An `ERR` packet returned by the server.
    ///
    /// Outside of the connection phase this is recoverable; the connection
    /// stays usable for further commands.
    #[error("error returned from the server: {0}")]
    Database(#[source] MySqlDatabaseError),

    /// A column value could not be decoded into the requested shape.
    ///
    /// Recoverable: the row stream may be advanced past the offending row.
    #[error("error decoding column value: {0}")]
    Decode(Cow<'static, str>),

    /// The in-flight command was cancelled before its response completed.
    #[error("command was cancelled")]
    Cancelled,

    /// A previous fatal error closed this connection.
    #[error("connection closed due to an earlier fatal error")]
    Closed,
}

/// Loss of synchronization in the 4-byte packet frame layer. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("packets out of order: received sequence {actual} but expected {expected}")]
    SequenceMismatch { expected: u8, actual: u8 },

    #[error("connection reset by the server in the middle of a packet")]
    UnexpectedEof,
}

/// Failure during the authentication exchange. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("server requested an unsupported authentication plugin: {0:?}")]
    UnknownPlugin(String),

    #[error("mysql_clear_password may only be used over a TLS connection")]
    InsecureClearPassword,

    #[error("malformed authentication data from the server: {0}")]
    MalformedAuthData(&'static str),

    #[error("failed to encrypt the password with the server's RSA public key: {0}")]
    Rsa(String),
}

/// An error directly reported by the server in an `ERR` packet:
/// an error code, an optional 5-character SQLSTATE, and a message.
#[derive(Debug)]
pub struct MySqlDatabaseError(pub(crate) ErrPacket);

impl MySqlDatabaseError {
    /// The server error code.
    ///
    /// Codes are documented in the MySQL server error reference.
    pub const fn code(&self) -> u16 {
        self.0.error_code
    }

    /// The standard SQLSTATE code, or `""` when the server did not send one.
    pub fn sql_state(&self) -> &str {
        self.0.sql_state.as_deref().unwrap_or_default()
    }

    /// The human-readable error message.
    pub fn message(&self) -> &str {
        &self.0.error_message
    }

    /// `ER_DUP_ENTRY` or `ER_DUP_ENTRY_WITH_KEY_NAME`
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.code(), 1062 | 1586)
    }

    /// `ER_NO_REFERENCED_ROW{,_2}` or `ER_ROW_IS_REFERENCED{,_2}`
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.code(), 1216 | 1217 | 1451 | 1452)
    }

    /// `ER_BAD_NULL_ERROR`
    pub fn is_not_null_violation(&self) -> bool {
        self.code() == 1048
    }
}

impl std::fmt::Display for MySqlDatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.sql_state {
            Some(state) => write!(f, "{} ({}): {}", self.0.error_code, state, self.message()),
            None => write!(f, "{}: {}", self.0.error_code, self.message()),
        }
    }
}

impl std::error::Error for MySqlDatabaseError {}

impl From<ErrPacket> for Error {
    fn from(err: ErrPacket) -> Self {
        Error::Database(MySqlDatabaseError(err))
    }
}

// shorthand for `Error::Protocol(format!(..))`, used throughout the decoders
macro_rules! err_protocol {
    ($($args:tt)*) => {
        $crate::error::Error::Protocol(format!($($args)*))
    };
}

pub(crate) use err_protocol;
