use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Result};
use crate::io::{BufExt, ProtocolDecode};

/// The server's request that the client stream a local file for
/// `LOAD DATA LOCAL INFILE`.
///
/// This client never reads local files; the request is recognized only so it
/// can be terminated safely with an empty packet, after which the server
/// responds with the usual OK or ERR.
///
/// <https://dev.mysql.com/doc/internals/en/com-query-response.html#packet-Protocol::LOCAL_INFILE_Request>
#[derive(Debug)]
pub(crate) struct LocalInfileRequest {
    pub(crate) filename: String,
}

impl ProtocolDecode<'_> for LocalInfileRequest {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        let tag = buf.get_u8();
        if tag != 0xfb {
            return Err(err_protocol!("expected LOCAL INFILE request (0xfb), got 0x{tag:02x}"));
        }

        let filename = buf.get_str_eof()?;

        Ok(Self { filename })
    }
}
