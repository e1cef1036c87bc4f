use bytes::{Buf, Bytes};

use crate::column::MySqlColumn;
use crate::error::Result;
use crate::io::{MySqlBufExt, ProtocolDecode};
use crate::protocol::Row;

/// One row of a `COM_QUERY` result set: one length-encoded string per
/// column, with the single byte `0xfb` marking NULL.
///
/// <https://dev.mysql.com/doc/internals/en/com-query-response.html#packet-ProtocolText::ResultsetRow>
#[derive(Debug)]
pub(crate) struct TextRow(pub(crate) Row);

impl<'de> ProtocolDecode<'de, &'de [MySqlColumn]> for TextRow {
    fn decode_with(mut buf: Bytes, columns: &'de [MySqlColumn]) -> Result<Self> {
        let mut values = Vec::with_capacity(columns.len());

        for _ in columns {
            if buf.first() == Some(&0xfb) {
                buf.advance(1);
                values.push(None);
            } else {
                values.push(Some(buf.get_bytes_lenenc()?));
            }
        }

        Ok(Self(Row { values }))
    }
}
