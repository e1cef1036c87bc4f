use bytes::Bytes;

use crate::error::{Error, Result};

/// A server-to-client protocol message that can be parsed out of a complete
/// packet payload, possibly with additional context (usually the negotiated
/// [`Capabilities`][crate::Capabilities], which change the wire shape of
/// nearly every message).
pub trait ProtocolDecode<'de, Context = ()>: Sized {
    fn decode(buf: Bytes) -> Result<Self, Error>
    where
        Self: ProtocolDecode<'de, ()>,
    {
        Self::decode_with(buf, ())
    }

    fn decode_with(buf: Bytes, context: Context) -> Result<Self, Error>;
}

impl ProtocolDecode<'_> for Bytes {
    #[inline]
    fn decode_with(buf: Bytes, _: ()) -> Result<Self, Error> {
        Ok(buf)
    }
}
