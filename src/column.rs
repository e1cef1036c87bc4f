use crate::type_info::MySqlTypeInfo;

/// One column of a result set: its position, display name, and type.
#[derive(Debug, Clone)]
pub struct MySqlColumn {
    pub(crate) ordinal: usize,
    pub(crate) name: String,
    pub(crate) type_info: MySqlTypeInfo,
}

impl MySqlColumn {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The column alias if one was given, otherwise the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_info(&self) -> &MySqlTypeInfo {
        &self.type_info
    }
}
