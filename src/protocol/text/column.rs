use bytes::{Buf, Bytes};

use crate::collation::Collation;
use crate::error::Result;
use crate::io::{MySqlBufExt, ProtocolDecode};
use crate::protocol::Capabilities;
use crate::type_info::{ColumnFlags, ColumnType, MySqlTypeInfo};

/// Per-column metadata sent ahead of the rows of every result set, and for
/// the parameters and columns of every prepared statement.
///
/// <https://dev.mysql.com/doc/internals/en/com-query-response.html#packet-Protocol::ColumnDefinition41>
/// <https://mariadb.com/kb/en/result-set-packets/#column-definition-packet>
#[derive(Debug)]
pub(crate) struct ColumnDefinition {
    #[allow(dead_code)]
    pub(crate) schema: String,
    #[allow(dead_code)]
    pub(crate) table_alias: String,
    #[allow(dead_code)]
    pub(crate) table: String,
    pub(crate) alias: String,
    pub(crate) name: String,
    pub(crate) collation: u16,
    #[allow(dead_code)]
    pub(crate) max_size: u32,
    pub(crate) r#type: ColumnType,
    pub(crate) flags: ColumnFlags,
    #[allow(dead_code)]
    pub(crate) decimals: u8,
}

impl ColumnDefinition {
    /// The name a caller would address this column by: the alias when the
    /// query gave one, otherwise the origin column name.
    pub(crate) fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    pub(crate) fn type_info(&self) -> MySqlTypeInfo {
        MySqlTypeInfo {
            r#type: self.r#type,
            flags: self.flags,
            collation: Collation(self.collation),
        }
    }
}

impl ProtocolDecode<'_, Capabilities> for ColumnDefinition {
    fn decode_with(mut buf: Bytes, _: Capabilities) -> Result<Self> {
        // catalog : string<lenenc>, in practice always "def"
        let catalog = buf.get_str_lenenc()?;
        debug_assert_eq!(catalog, "def");

        let schema = buf.get_str_lenenc()?;
        let table_alias = buf.get_str_lenenc()?;
        let table = buf.get_str_lenenc()?;
        let alias = buf.get_str_lenenc()?;
        let name = buf.get_str_lenenc()?;

        // length of the fixed metadata block : int<lenenc>, always 0x0c
        let fixed_len = buf.get_uint_lenenc()?;
        debug_assert_eq!(fixed_len, 0x0c);

        let collation = buf.get_u16_le();
        let max_size = buf.get_u32_le();
        let r#type = ColumnType::try_from_u8(buf.get_u8())?;
        let flags = ColumnFlags::from_bits_truncate(buf.get_u16_le());
        let decimals = buf.get_u8();

        Ok(Self {
            schema,
            table_alias,
            table,
            alias,
            name,
            collation,
            max_size,
            r#type,
            flags,
            decimals,
        })
    }
}
