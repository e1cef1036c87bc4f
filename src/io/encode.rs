use crate::error::{Error, Result};

/// A client-to-server protocol message that serializes itself onto the end of
/// a packet payload buffer, possibly depending on additional context.
pub trait ProtocolEncode<'en, Context = ()> {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), Error>
    where
        Self: ProtocolEncode<'en, ()>,
    {
        self.encode_with(buf, ())
    }

    fn encode_with(&self, buf: &mut Vec<u8>, context: Context) -> Result<(), Error>;
}

// raw bytes pass through unchanged (used for auth-exchange payloads)
impl<C> ProtocolEncode<'_, C> for &'_ [u8] {
    fn encode_with(&self, buf: &mut Vec<u8>, _context: C) -> Result<(), Error> {
        buf.extend_from_slice(self);
        Ok(())
    }
}
