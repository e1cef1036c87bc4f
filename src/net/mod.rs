//! The transport boundary consumed by the protocol core.
//!
//! The core never resolves addresses or opens sockets; it drives an
//! already-established duplex byte channel through [`Socket`], and asks the
//! host for a TLS-wrapped replacement channel through [`TlsUpgrade`] when the
//! connect options request encryption.

mod buffered;
mod socket;
mod tls;

pub(crate) use buffered::BufferedSocket;
pub use socket::Socket;
pub use tls::{NoTls, TlsConfig, TlsUpgrade};
