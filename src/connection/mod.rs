use std::fmt::{self, Debug, Formatter};

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::protocol::response::Status;
use crate::protocol::text::{Ping, Quit};
use crate::query_result::MySqlQueryResult;

mod auth;
mod establish;
mod executor;
mod stream;
mod tls;

#[cfg(test)]
mod tests;

pub use executor::MySqlRowStream;
pub(crate) use stream::MySqlStream;

/// A single logical connection to a MySQL server.
///
/// Created by [`connect_with`][MySqlConnection::connect_with] over a
/// caller-supplied byte channel. At most one command runs at a time; result
/// rows are pulled through a [`MySqlRowStream`] that exclusively borrows the
/// connection until it is drained or dropped.
pub struct MySqlConnection {
    pub(crate) stream: MySqlStream,

    /// Server-assigned id for this session, from the greeting.
    pub(crate) connection_id: u32,

    pub(crate) server_version: (u16, u16, u16),
    pub(crate) server_version_raw: String,

    /// Statement id -> parameter count, for every statement prepared on
    /// this session and not yet closed.
    pub(crate) statements: HashMap<u32, usize>,

    pub(crate) last_result: Option<MySqlQueryResult>,
}

impl MySqlConnection {
    /// Check that the server connection is alive.
    pub async fn ping(&mut self) -> Result<()> {
        self.guard_closed()?;
        self.stream.wait_until_ready().await?;
        self.stream.send_packet(Ping).await?;
        self.stream.recv_ok().await?;

        Ok(())
    }

    /// End the session cleanly: announce `COM_QUIT`, then close the channel.
    ///
    /// The server does not respond to `COM_QUIT`.
    pub async fn quit(mut self) -> Result<()> {
        if !self.stream.closed {
            self.stream.wait_until_ready().await?;
            self.stream.send_packet(Quit).await?;
        }

        self.stream.shutdown().await
    }

    /// Close the channel without the protocol goodbye.
    pub async fn close_hard(mut self) -> Result<()> {
        self.stream.shutdown().await
    }

    /// The status flags from the most recent OK or EOF packet.
    pub fn status(&self) -> Status {
        self.stream.status
    }

    /// Summary of the most recently completed command, if any.
    pub fn last_query_result(&self) -> Option<&MySqlQueryResult> {
        self.last_result.as_ref()
    }

    /// Server-assigned connection id.
    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    /// Server version as a `(major, minor, patch)` triple.
    pub fn server_version(&self) -> (u16, u16, u16) {
        self.server_version
    }

    /// The unparsed server version banner, e.g. `"8.0.30-debug"`.
    pub fn server_version_raw(&self) -> &str {
        &self.server_version_raw
    }

    /// Whether the channel was upgraded to TLS during the handshake.
    pub fn is_tls(&self) -> bool {
        self.stream.is_tls
    }

    /// Release oversized internal buffers, e.g. after streaming a huge row.
    pub fn shrink_buffers(&mut self) {
        self.stream.shrink_buffers();
    }

    pub(crate) fn guard_closed(&self) -> Result<()> {
        if self.stream.closed {
            return Err(Error::Closed);
        }

        Ok(())
    }
}

impl Debug for MySqlConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("connection_id", &self.connection_id)
            .field("server_version", &self.server_version_raw)
            .finish()
    }
}
