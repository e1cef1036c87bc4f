// MySQL conflates on-disk collation order with the wire character encoding:
// the collation id sent in column metadata is informational only, except for
// `binary` (63) which is never transcoded by the server. As long as the
// connection collation is a UTF-8 one, every non-binary string column can be
// treated as UTF-8 compatible bytes; this crate leaves payloads opaque and
// merely tags them with the collation id.

/// A MySQL collation id, as exchanged during the handshake and attached to
/// every string-family column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collation(pub u16);

impl Collation {
    pub const LATIN1_SWEDISH_CI: Collation = Collation(8);

    /// The legacy 3-byte UTF-8 collation; the historical client default.
    pub const UTF8_GENERAL_CI: Collation = Collation(33);

    /// Collation used for all non-string data; never transcoded.
    pub const BINARY: Collation = Collation(63);

    /// The most broadly supported full-range UTF-8 collation.
    pub const UTF8MB4_GENERAL_CI: Collation = Collation(45);

    pub const UTF8MB4_UNICODE_CI: Collation = Collation(224);

    /// Default collation of MySQL 8.0 servers.
    pub const UTF8MB4_0900_AI_CI: Collation = Collation(255);

    /// Returns `true` if column data under this collation is raw binary.
    pub const fn is_binary(self) -> bool {
        self.0 == Collation::BINARY.0
    }

    /// Returns `true` if this is one of the known UTF-8-compatible
    /// collations, meaning string payloads may be interpreted as UTF-8.
    pub const fn is_utf8(self) -> bool {
        matches!(
            self.0,
            33 | 45 | 46 | 76 | 83 | 192..=247 | 255..=323
        )
    }
}

impl From<u16> for Collation {
    fn from(id: u16) -> Self {
        Collation(id)
    }
}
