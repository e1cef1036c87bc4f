use bytes::{Buf, Bytes};

use crate::column::MySqlColumn;
use crate::error::{err_protocol, Result};
use crate::io::{BufExt, MySqlBufExt, ProtocolDecode};
use crate::protocol::Row;
use crate::type_info::ColumnType;

/// One row of a `COM_STMT_EXECUTE` result set: a `0x00` header, a NULL
/// bitmap offset by two bits, then the non-NULL values back to back in their
/// per-type binary encodings.
///
/// <https://dev.mysql.com/doc/internals/en/binary-protocol-resultset-row.html>
/// <https://mariadb.com/kb/en/resultset-row/#binary-resultset-row>
#[derive(Debug)]
pub(crate) struct BinaryRow(pub(crate) Row);

impl<'de> ProtocolDecode<'de, &'de [MySqlColumn]> for BinaryRow {
    fn decode_with(mut buf: Bytes, columns: &'de [MySqlColumn]) -> Result<Self> {
        let header = buf.get_u8();
        if header != 0 {
            return Err(err_protocol!("expected binary row (0x00), got 0x{header:02x}"));
        }

        // NULL bitmap : byte<(columns + 7 + 2) / 8>, low two bits unused
        let bitmap_len = (columns.len() + 7 + 2) / 8;
        let null_bitmap = buf.get_bytes(bitmap_len)?;

        let mut values = Vec::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            let bit = i + 2;

            if null_bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
                values.push(None);
                continue;
            }

            let size = match column.type_info.r#type {
                ColumnType::Null => 0,

                ColumnType::Tiny => 1,
                ColumnType::Short | ColumnType::Year => 2,
                ColumnType::Long | ColumnType::Int24 | ColumnType::Float => 4,
                ColumnType::LongLong | ColumnType::Double => 8,

                // temporal values carry their own 1-byte length
                ColumnType::Date
                | ColumnType::NewDate
                | ColumnType::Time
                | ColumnType::Time2
                | ColumnType::Timestamp
                | ColumnType::Timestamp2
                | ColumnType::Datetime
                | ColumnType::Datetime2 => {
                    let len = *buf.first().ok_or_else(|| {
                        err_protocol!("binary row truncated before temporal value")
                    })?;

                    1 + usize::from(len)
                }

                // everything else is a length-encoded byte string; strip the
                // prefix here so the stored value is the payload itself
                ColumnType::Decimal
                | ColumnType::NewDecimal
                | ColumnType::Bit
                | ColumnType::Json
                | ColumnType::Enum
                | ColumnType::Set
                | ColumnType::TinyBlob
                | ColumnType::MediumBlob
                | ColumnType::LongBlob
                | ColumnType::Blob
                | ColumnType::VarChar
                | ColumnType::VarString
                | ColumnType::String
                | ColumnType::Geometry => {
                    values.push(Some(buf.get_bytes_lenenc()?));
                    continue;
                }
            };

            values.push(Some(buf.get_bytes(size)?));
        }

        Ok(Self(Row { values }))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::BinaryRow;
    use crate::collation::Collation;
    use crate::column::MySqlColumn;
    use crate::io::ProtocolDecode;
    use crate::type_info::{ColumnFlags, ColumnType, MySqlTypeInfo};

    fn column(ordinal: usize, ty: ColumnType) -> MySqlColumn {
        MySqlColumn {
            ordinal,
            name: format!("c{ordinal}"),
            type_info: MySqlTypeInfo {
                r#type: ty,
                flags: ColumnFlags::empty(),
                collation: Collation::BINARY,
            },
        }
    }

    // two columns, the first NULL: the bitmap is offset by two bits, so
    // column 0 maps to bit 2 (0x04)
    #[test]
    fn null_bitmap_is_offset_by_two_bits() {
        const DATA: &[u8] = b"\x00\x04\x07\x00\x00\x00";

        let columns = [column(0, ColumnType::Null), column(1, ColumnType::Long)];
        let row = BinaryRow::decode_with(Bytes::from_static(DATA), &columns).unwrap().0;

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), None);
        assert_eq!(row.get(1).map(|v| &v[..]), Some(&[0x07, 0x00, 0x00, 0x00][..]));
    }

    #[test]
    fn fixed_and_lenenc_values_interleave() {
        // LONGLONG 2, then VARCHAR "ok", then DATE 2024-12-31
        const DATA: &[u8] = b"\x00\x00\
            \x02\x00\x00\x00\x00\x00\x00\x00\
            \x02ok\
            \x04\xe8\x07\x0c\x1f";

        let columns = [
            column(0, ColumnType::LongLong),
            column(1, ColumnType::VarChar),
            column(2, ColumnType::Date),
        ];

        let row = BinaryRow::decode_with(Bytes::from_static(DATA), &columns).unwrap().0;

        assert_eq!(row.get(0).map(|v| v.len()), Some(8));
        assert_eq!(row.get(1).map(|v| &v[..]), Some(&b"ok"[..]));
        assert_eq!(row.get(2).map(|v| &v[..]), Some(&[0x04, 0xe8, 0x07, 0x0c, 0x1f][..]));
    }

    #[test]
    fn wide_rows_use_multi_byte_bitmaps() {
        // nine columns, all NULL: bits 2..=10 across two bitmap bytes
        const DATA: &[u8] = b"\x00\xfc\x07";

        let columns: Vec<_> = (0..9).map(|i| column(i, ColumnType::Long)).collect();
        let row = BinaryRow::decode_with(Bytes::from_static(DATA), &columns).unwrap().0;

        assert!((0..9).all(|i| row.get(i).is_none()));
    }
}
