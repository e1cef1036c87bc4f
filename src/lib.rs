//! A low-level, non-blocking client for the MySQL and MariaDB wire protocol.
//!
//! This crate implements the client half of the protocol only: the
//! connection-phase handshake and authentication (including auth-plugin
//! switching and the `caching_sha2_password` full-authentication exchange),
//! the mid-stream TLS upgrade, packet framing with the 16 MiB split rule, and
//! the text and binary result-set codecs. It is intended as the transport
//! layer underneath query builders, ORMs, and connection pools.
//!
//! The crate does not resolve addresses or open sockets; the caller provides
//! an established duplex byte channel through the [`Socket`] trait (an
//! implementation for tokio's `TcpStream` ships behind the default
//! `runtime-tokio` feature) and, when TLS is wanted, a [`TlsUpgrade`]
//! implementation to wrap it.
//!
//! ```no_run
//! use mywire::{MySqlConnection, MySqlConnectOptions, NoTls};
//!
//! # async fn example() -> mywire::Result<()> {
//! let socket = tokio::net::TcpStream::connect(("localhost", 3306)).await?;
//!
//! let options = MySqlConnectOptions::new()
//!     .username("root")
//!     .password("password")
//!     .database("shop");
//!
//! let mut conn = MySqlConnection::connect_with(socket, NoTls, &options).await?;
//!
//! let mut rows = conn.query("SELECT id, name FROM product").await?;
//! while let Some(row) = rows.next().await? {
//!     let id = row.get(0)?;
//!     let name = row.get(1)?;
//!     println!("{id:?}: {name:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;

mod collation;
mod column;
mod connection;
mod io;
mod options;
mod query_result;
mod row;
mod statement;
mod type_info;
mod value;

pub mod net;

pub(crate) mod protocol;

#[cfg(test)]
pub(crate) mod mock;

pub use collation::Collation;
pub use column::MySqlColumn;
pub use connection::{MySqlConnection, MySqlRowStream};
pub use error::{AuthError, Error, FramingError, MySqlDatabaseError, Result};
pub use net::{NoTls, Socket, TlsConfig, TlsUpgrade};
pub use options::{MySqlConnectOptions, MySqlSslMode};
pub use protocol::response::Status;
pub use protocol::Capabilities;
pub use query_result::MySqlQueryResult;
pub use row::MySqlRow;
pub use statement::MySqlStatement;
pub use type_info::{ColumnType, MySqlTypeInfo};
pub use value::{MySqlDate, MySqlDateTime, MySqlTime, MySqlValue, MySqlValueFormat};
