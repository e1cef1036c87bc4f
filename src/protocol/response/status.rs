// https://dev.mysql.com/doc/internals/en/status-flags.html
// https://mariadb.com/kb/en/library/mariadb-connectorc-types-and-definitions/#server-status
bitflags::bitflags! {
    /// Server status flags, refreshed by every OK and EOF packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u16 {
        /// A multi-statement transaction is open.
        const IN_TRANS = 0x0001;

        /// Autocommit mode is enabled.
        const AUTOCOMMIT = 0x0002;

        /// Another result set follows the current one.
        const MORE_RESULTS_EXISTS = 0x0008;

        const NO_GOOD_INDEX_USED = 0x0010;
        const NO_INDEX_USED = 0x0020;

        /// A cursor exists for the last prepared statement.
        const CURSOR_EXISTS = 0x0040;

        /// The last row of the open cursor has been sent.
        const LAST_ROW_SENT = 0x0080;

        /// The current schema was dropped.
        const DB_DROPPED = 0x0100;

        /// Backslash is not an escape character in the current SQL mode.
        const NO_BACKSLASH_ESCAPES = 0x0200;

        /// A DDL change forced an automatic re-prepare of a statement.
        const METADATA_CHANGED = 0x0400;

        /// The last statement exceeded long_query_time.
        const QUERY_WAS_SLOW = 0x0800;

        /// The result set contains stored-procedure out-parameters.
        const PS_OUT_PARAMS = 0x1000;

        /// The open transaction is read-only.
        const IN_TRANS_READONLY = 0x2000;

        /// Server session state changed with the last statement.
        const SESSION_STATE_CHANGED = 0x4000;
    }
}
