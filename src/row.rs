use std::sync::Arc;

use hashbrown::HashMap;

use crate::column::MySqlColumn;
use crate::error::{Error, Result};
use crate::protocol;
use crate::value::{self, MySqlValue, MySqlValueFormat};

/// One row of a result set.
///
/// Rows own their raw packet bytes and share the result set's column
/// metadata; column values decode on demand through [`get`][Self::get], so a
/// value that cannot be decoded only fails when it is actually read.
pub struct MySqlRow {
    pub(crate) row: protocol::Row,
    pub(crate) format: MySqlValueFormat,
    pub(crate) columns: Arc<Vec<MySqlColumn>>,
    pub(crate) column_names: Arc<HashMap<Box<str>, usize>>,
}

impl MySqlRow {
    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.len() == 0
    }

    pub fn columns(&self) -> &[MySqlColumn] {
        &self.columns
    }

    /// Which encoding this row arrived in.
    pub fn format(&self) -> MySqlValueFormat {
        self.format
    }

    /// Decode the value at `index`.
    pub fn get(&self, index: usize) -> Result<MySqlValue> {
        let column = self
            .columns
            .get(index)
            .ok_or_else(|| Error::Decode(format!("column index {index} out of bounds").into()))?;

        let Some(raw) = self.row.get(index) else {
            return Ok(MySqlValue::Null);
        };

        match self.format {
            MySqlValueFormat::Text => value::decode_text(&column.type_info, raw),
            MySqlValueFormat::Binary => value::decode_binary(&column.type_info, raw),
        }
    }

    /// Decode the value of the named column.
    pub fn get_by_name(&self, name: &str) -> Result<MySqlValue> {
        let index = *self
            .column_names
            .get(name)
            .ok_or_else(|| Error::Decode(format!("no column named {name:?}").into()))?;

        self.get(index)
    }

    /// The undecoded bytes at `index`, or `None` for NULL.
    pub fn raw(&self, index: usize) -> Option<&[u8]> {
        self.row.get(index).map(|bytes| &bytes[..])
    }
}

impl std::fmt::Debug for MySqlRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlRow")
            .field("columns", &self.row.len())
            .field("format", &self.format)
            .finish()
    }
}
