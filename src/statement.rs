use std::sync::Arc;

use hashbrown::HashMap;

use crate::column::MySqlColumn;

/// A handle to a statement prepared on one connection.
///
/// The handle is only meaningful to the connection that created it:
/// statement ids are scoped to a server session, and
/// [`execute`][crate::MySqlConnection::execute] rejects handles from other
/// connections. The server-side statement lives until
/// [`close_statement`][crate::MySqlConnection::close_statement] or until the
/// connection ends.
#[derive(Debug, Clone)]
pub struct MySqlStatement {
    pub(crate) id: u32,

    /// The id of the server session this statement belongs to.
    pub(crate) connection_id: u32,

    /// Number of `?` placeholders; their types are declared per-execute from
    /// the supplied values.
    pub(crate) parameters: usize,

    pub(crate) columns: Arc<Vec<MySqlColumn>>,
    pub(crate) column_names: Arc<HashMap<Box<str>, usize>>,
}

impl MySqlStatement {
    /// The server-assigned statement id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of parameter placeholders in the statement.
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// The result columns this statement produces, as reported at prepare
    /// time.
    pub fn columns(&self) -> &[MySqlColumn] {
        &self.columns
    }

    /// The ordinal of the named result column, if the statement has one.
    pub fn column_ordinal(&self, name: &str) -> Option<usize> {
        self.column_names.get(name).copied()
    }
}
