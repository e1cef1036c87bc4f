use std::fmt::{self, Display, Formatter};

use crate::collation::Collation;
use crate::error::{err_protocol, Result};

/// The raw wire type of a column, from the column definition's type byte.
///
/// Together with the `UNSIGNED` column flag and the collation id this fully
/// determines how a value is encoded in text and binary result sets.
///
/// <https://dev.mysql.com/doc/internals/en/com-query-response.html#column-type>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColumnType {
    Decimal = 0x00,
    Tiny = 0x01,
    Short = 0x02,
    Long = 0x03,
    Float = 0x04,
    Double = 0x05,
    Null = 0x06,
    Timestamp = 0x07,
    LongLong = 0x08,
    Int24 = 0x09,
    Date = 0x0a,
    Time = 0x0b,
    Datetime = 0x0c,
    Year = 0x0d,
    NewDate = 0x0e,
    VarChar = 0x0f,
    Bit = 0x10,
    Timestamp2 = 0x11,
    Datetime2 = 0x12,
    Time2 = 0x13,
    Json = 0xf5,
    NewDecimal = 0xf6,
    Enum = 0xf7,
    Set = 0xf8,
    TinyBlob = 0xf9,
    MediumBlob = 0xfa,
    LongBlob = 0xfb,
    Blob = 0xfc,
    VarString = 0xfd,
    String = 0xfe,
    Geometry = 0xff,
}

impl ColumnType {
    pub(crate) fn try_from_u8(id: u8) -> Result<Self> {
        Ok(match id {
            0x00 => ColumnType::Decimal,
            0x01 => ColumnType::Tiny,
            0x02 => ColumnType::Short,
            0x03 => ColumnType::Long,
            0x04 => ColumnType::Float,
            0x05 => ColumnType::Double,
            0x06 => ColumnType::Null,
            0x07 => ColumnType::Timestamp,
            0x08 => ColumnType::LongLong,
            0x09 => ColumnType::Int24,
            0x0a => ColumnType::Date,
            0x0b => ColumnType::Time,
            0x0c => ColumnType::Datetime,
            0x0d => ColumnType::Year,
            0x0e => ColumnType::NewDate,
            0x0f => ColumnType::VarChar,
            0x10 => ColumnType::Bit,
            0x11 => ColumnType::Timestamp2,
            0x12 => ColumnType::Datetime2,
            0x13 => ColumnType::Time2,
            0xf5 => ColumnType::Json,
            0xf6 => ColumnType::NewDecimal,
            0xf7 => ColumnType::Enum,
            0xf8 => ColumnType::Set,
            0xf9 => ColumnType::TinyBlob,
            0xfa => ColumnType::MediumBlob,
            0xfb => ColumnType::LongBlob,
            0xfc => ColumnType::Blob,
            0xfd => ColumnType::VarString,
            0xfe => ColumnType::String,
            0xff => ColumnType::Geometry,

            _ => return Err(err_protocol!("unknown column type 0x{id:02x}")),
        })
    }
}

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/group__group__cs__column__definition__flags.html
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ColumnFlags: u16 {
        /// Column cannot be NULL.
        const NOT_NULL = 0x0001;

        /// Column is part of a primary key.
        const PRIMARY_KEY = 0x0002;

        /// Column is part of a unique key.
        const UNIQUE_KEY = 0x0004;

        /// Column is part of a non-unique key.
        const MULTIPLE_KEY = 0x0008;

        const BLOB = 0x0010;

        /// Integer column is unsigned; selects the unsigned binary codec.
        const UNSIGNED = 0x0020;

        const ZEROFILL = 0x0040;

        /// String column holds binary data (collation 63).
        const BINARY = 0x0080;

        const ENUM = 0x0100;
        const AUTO_INCREMENT = 0x0200;
        const TIMESTAMP = 0x0400;
        const SET = 0x0800;
        const NO_DEFAULT_VALUE = 0x1000;
        const ON_UPDATE_NOW = 0x2000;
        const NUM = 0x8000;
    }
}

/// Decoded type information for one result-set column.
#[derive(Debug, Clone)]
pub struct MySqlTypeInfo {
    pub(crate) r#type: ColumnType,
    pub(crate) flags: ColumnFlags,
    pub(crate) collation: Collation,
}

impl MySqlTypeInfo {
    pub fn r#type(&self) -> ColumnType {
        self.r#type
    }

    pub fn collation(&self) -> Collation {
        self.collation
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED)
    }

    pub fn is_nullable(&self) -> bool {
        !self.flags.contains(ColumnFlags::NOT_NULL)
    }

    /// SQL name of the type, accounting for signedness and binary collation.
    pub fn name(&self) -> &'static str {
        let unsigned = self.is_unsigned();
        let binary = self.collation.is_binary();

        match self.r#type {
            ColumnType::Tiny if unsigned => "TINYINT UNSIGNED",
            ColumnType::Tiny => "TINYINT",
            ColumnType::Short if unsigned => "SMALLINT UNSIGNED",
            ColumnType::Short => "SMALLINT",
            ColumnType::Int24 if unsigned => "MEDIUMINT UNSIGNED",
            ColumnType::Int24 => "MEDIUMINT",
            ColumnType::Long if unsigned => "INT UNSIGNED",
            ColumnType::Long => "INT",
            ColumnType::LongLong if unsigned => "BIGINT UNSIGNED",
            ColumnType::LongLong => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Null => "NULL",
            ColumnType::Timestamp | ColumnType::Timestamp2 => "TIMESTAMP",
            ColumnType::Date | ColumnType::NewDate => "DATE",
            ColumnType::Time | ColumnType::Time2 => "TIME",
            ColumnType::Datetime | ColumnType::Datetime2 => "DATETIME",
            ColumnType::Year => "YEAR",
            ColumnType::Bit => "BIT",
            ColumnType::Json => "JSON",
            ColumnType::Decimal | ColumnType::NewDecimal => "DECIMAL",
            ColumnType::Enum => "ENUM",
            ColumnType::Set => "SET",
            ColumnType::TinyBlob if binary => "TINYBLOB",
            ColumnType::TinyBlob => "TINYTEXT",
            ColumnType::MediumBlob if binary => "MEDIUMBLOB",
            ColumnType::MediumBlob => "MEDIUMTEXT",
            ColumnType::LongBlob if binary => "LONGBLOB",
            ColumnType::LongBlob => "LONGTEXT",
            ColumnType::Blob if binary => "BLOB",
            ColumnType::Blob => "TEXT",
            ColumnType::VarChar | ColumnType::VarString if binary => "VARBINARY",
            ColumnType::VarChar | ColumnType::VarString => "VARCHAR",
            ColumnType::String if binary => "BINARY",
            ColumnType::String => "CHAR",
            ColumnType::Geometry => "GEOMETRY",
        }
    }
}

impl Display for MySqlTypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
