// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/group__group__cs__capabilities__flags.html
// https://mariadb.com/kb/en/library/connection/#capabilities
bitflags::bitflags! {
    /// The capability flags exchanged during the handshake.
    ///
    /// The effective set for a session is the intersection of what this
    /// client requests and what the server advertises; it selects the wire
    /// shape of nearly every subsequent packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u64 {
        // use the improved version of the "old password" hash
        // assumed set by every 4.1+ server
        const LONG_PASSWORD = 0x0000_0001;

        // return the number of matched instead of changed rows in OK packets
        const FOUND_ROWS = 0x0000_0002;

        // column metadata carries the longer flags field
        const LONG_FLAG = 0x0000_0004;

        // the handshake response may name a default schema
        const CONNECT_WITH_DB = 0x0000_0008;

        // do not permit `database.table.column` references
        const NO_SCHEMA = 0x0000_0010;

        // compressed protocol (never requested by this client)
        const COMPRESS = 0x0000_0020;

        // legacy ODBC-client marker; no behavior since 3.22
        const ODBC = 0x0000_0040;

        // allow LOAD DATA LOCAL INFILE
        const LOCAL_FILES = 0x0000_0080;

        // parser ignores spaces before '('
        const IGNORE_SPACE = 0x0000_0100;

        // speak the 4.1+ protocol; mandatory for this client
        const PROTOCOL_41 = 0x0000_0200;

        // interactive client: use interactive_timeout for idle disconnects
        const INTERACTIVE = 0x0000_0400;

        // switch to TLS after the SSLRequest packet
        const SSL = 0x0000_0800;

        // status flags carry transaction state
        const TRANSACTIONS = 0x0000_2000;

        // 4.1+ authentication; mandatory for this client
        const SECURE_CONNECTION = 0x0000_8000;

        // multiple statements per COM_QUERY / COM_STMT_PREPARE
        const MULTI_STATEMENTS = 0x0001_0000;

        // COM_QUERY responses may contain multiple result sets
        const MULTI_RESULTS = 0x0002_0000;

        // COM_STMT_EXECUTE responses may contain multiple result sets
        const PS_MULTI_RESULTS = 0x0004_0000;

        // authentication plugins; mandatory for this client
        const PLUGIN_AUTH = 0x0008_0000;

        // connection attributes in the handshake response
        const CONNECT_ATTRS = 0x0010_0000;

        // auth response in the handshake response is length-encoded
        const PLUGIN_AUTH_LENENC_DATA = 0x0020_0000;

        // client can handle expired passwords
        const CAN_HANDLE_EXPIRED_PASSWORDS = 0x0040_0000;

        // OK packets carry session state-change information
        const SESSION_TRACK = 0x0080_0000;

        // server replaces EOF packets with OK-shaped packets tagged 0xfe
        const DEPRECATE_EOF = 0x0100_0000;
    }
}
