use bytes::{Buf, Bytes};

use crate::collation::Collation;
use crate::error::{Error, Result};
use crate::io::MySqlBufMutExt;
use crate::type_info::{ColumnType, MySqlTypeInfo};

/// Which result-set encoding a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MySqlValueFormat {
    /// `COM_QUERY` responses: every value is a length-encoded string.
    Text,

    /// `COM_STMT_EXECUTE` responses: per-type binary encodings.
    Binary,
}

/// A single decoded column value or statement parameter.
///
/// Integer variants carry their wire width and signedness explicitly; that
/// width selects the parameter type sent for `COM_STMT_EXECUTE`. String and
/// blob payloads stay opaque, tagged with their collation id.
#[derive(Debug, Clone, PartialEq)]
pub enum MySqlValue {
    Null,

    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    Float(f32),
    Double(f64),

    /// String, blob, JSON, bit, enum, set, and geometry payloads.
    Bytes { data: Bytes, collation: Collation },

    Date(MySqlDate),
    DateTime(MySqlDateTime),
    Time(MySqlTime),

    /// An exact decimal, kept in its textual form.
    Decimal(String),
}

/// A calendar date; all-zero for MySQL's `0000-00-00` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MySqlDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// A date and time of day with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MySqlDateTime {
    pub date: MySqlDate,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micros: u32,
}

/// A signed duration: `TIME` columns span `-838:59:59` to `838:59:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MySqlTime {
    pub negative: bool,
    pub days: u32,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micros: u32,
}

impl MySqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MySqlValue::Null)
    }

    /// The value as a signed integer, if it is any integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            MySqlValue::Int8(v) => Some(v.into()),
            MySqlValue::Int16(v) => Some(v.into()),
            MySqlValue::Int32(v) => Some(v.into()),
            MySqlValue::Int64(v) => Some(v),
            MySqlValue::UInt8(v) => Some(v.into()),
            MySqlValue::UInt16(v) => Some(v.into()),
            MySqlValue::UInt32(v) => Some(v.into()),
            MySqlValue::UInt64(v) => i64::try_from(v).ok(),

            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            MySqlValue::Bytes { data, .. } => Some(data),

            _ => None,
        }
    }

    /// The value as UTF-8 text, if it is a string under a UTF-8-compatible
    /// collation.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MySqlValue::Bytes { data, collation } if collation.is_utf8() => {
                std::str::from_utf8(data).ok()
            }

            _ => None,
        }
    }

    /// The parameter type and unsigned flag announced for this value in the
    /// `COM_STMT_EXECUTE` type block.
    pub(crate) fn param_type(&self) -> (ColumnType, bool) {
        match self {
            MySqlValue::Null => (ColumnType::Null, false),

            MySqlValue::Int8(_) => (ColumnType::Tiny, false),
            MySqlValue::Int16(_) => (ColumnType::Short, false),
            MySqlValue::Int32(_) => (ColumnType::Long, false),
            MySqlValue::Int64(_) => (ColumnType::LongLong, false),

            MySqlValue::UInt8(_) => (ColumnType::Tiny, true),
            MySqlValue::UInt16(_) => (ColumnType::Short, true),
            MySqlValue::UInt32(_) => (ColumnType::Long, true),
            MySqlValue::UInt64(_) => (ColumnType::LongLong, true),

            MySqlValue::Float(_) => (ColumnType::Float, false),
            MySqlValue::Double(_) => (ColumnType::Double, false),

            MySqlValue::Bytes { .. } => (ColumnType::Blob, false),

            MySqlValue::Date(_) => (ColumnType::Date, false),
            MySqlValue::DateTime(_) => (ColumnType::Datetime, false),
            MySqlValue::Time(_) => (ColumnType::Time, false),

            MySqlValue::Decimal(_) => (ColumnType::NewDecimal, false),
        }
    }

    /// Append the binary-protocol encoding of this value.
    ///
    /// [`MySqlValue::Null`] encodes to nothing; NULL travels in the
    /// statement's NULL bitmap instead.
    pub(crate) fn encode_binary(&self, buf: &mut Vec<u8>) {
        match self {
            MySqlValue::Null => {}

            MySqlValue::Int8(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::Int16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),

            MySqlValue::UInt8(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::UInt16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::UInt32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::UInt64(v) => buf.extend_from_slice(&v.to_le_bytes()),

            MySqlValue::Float(v) => buf.extend_from_slice(&v.to_le_bytes()),
            MySqlValue::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),

            MySqlValue::Bytes { data, .. } => buf.put_bytes_lenenc(data),

            MySqlValue::Date(date) => encode_date(buf, date),
            MySqlValue::DateTime(dt) => encode_datetime(buf, dt),
            MySqlValue::Time(time) => encode_time(buf, time),

            MySqlValue::Decimal(s) => buf.put_str_lenenc(s),
        }
    }
}

fn decode_err(ty: ColumnType, what: &str) -> Error {
    Error::Decode(format!("invalid {what} for column type {ty:?}").into())
}

/// Decode one non-NULL text-protocol value according to its column type.
pub(crate) fn decode_text(type_info: &MySqlTypeInfo, raw: &Bytes) -> Result<MySqlValue> {
    let ty = type_info.r#type;

    let text = || {
        std::str::from_utf8(raw).map_err(|_| decode_err(ty, "non-UTF-8 text value"))
    };

    Ok(match ty {
        ColumnType::Null => MySqlValue::Null,

        ColumnType::Tiny | ColumnType::Short | ColumnType::Long | ColumnType::Int24
        | ColumnType::LongLong => {
            if type_info.is_unsigned() {
                let v: u64 = text()?.parse().map_err(|_| decode_err(ty, "integer"))?;

                match ty {
                    ColumnType::Tiny => MySqlValue::UInt8(v as u8),
                    ColumnType::Short => MySqlValue::UInt16(v as u16),
                    ColumnType::Long | ColumnType::Int24 => MySqlValue::UInt32(v as u32),
                    _ => MySqlValue::UInt64(v),
                }
            } else {
                let v: i64 = text()?.parse().map_err(|_| decode_err(ty, "integer"))?;

                match ty {
                    ColumnType::Tiny => MySqlValue::Int8(v as i8),
                    ColumnType::Short => MySqlValue::Int16(v as i16),
                    ColumnType::Long | ColumnType::Int24 => MySqlValue::Int32(v as i32),
                    _ => MySqlValue::Int64(v),
                }
            }
        }

        ColumnType::Year => {
            MySqlValue::UInt16(text()?.parse().map_err(|_| decode_err(ty, "year"))?)
        }

        ColumnType::Float => {
            MySqlValue::Float(text()?.parse().map_err(|_| decode_err(ty, "float"))?)
        }

        ColumnType::Double => {
            MySqlValue::Double(text()?.parse().map_err(|_| decode_err(ty, "double"))?)
        }

        ColumnType::Decimal | ColumnType::NewDecimal => MySqlValue::Decimal(text()?.to_owned()),

        ColumnType::Date | ColumnType::NewDate => MySqlValue::Date(parse_date(ty, text()?)?),

        ColumnType::Datetime | ColumnType::Datetime2 | ColumnType::Timestamp
        | ColumnType::Timestamp2 => {
            let text = text()?;
            let (date, time) = text
                .split_once(' ')
                .ok_or_else(|| decode_err(ty, "datetime"))?;

            let date = parse_date(ty, date)?;
            let (hour, minute, second, micros) = parse_hms(ty, time)?;

            MySqlValue::DateTime(MySqlDateTime { date, hour, minute, second, micros })
        }

        ColumnType::Time | ColumnType::Time2 => {
            let text = text()?;
            let (negative, text) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text),
            };

            // hours may exceed two digits: up to 838:59:59
            let (hours, rest) = text.split_once(':').ok_or_else(|| decode_err(ty, "time"))?;
            let hours: u32 = hours.parse().map_err(|_| decode_err(ty, "time"))?;
            let (_, minute, second, micros) = parse_hms(ty, &format!("00:{rest}"))?;

            MySqlValue::Time(MySqlTime {
                negative,
                days: hours / 24,
                hour: (hours % 24) as u8,
                minute,
                second,
                micros,
            })
        }

        _ => MySqlValue::Bytes { data: raw.clone(), collation: type_info.collation },
    })
}

/// Decode one non-NULL binary-protocol value according to its column type.
pub(crate) fn decode_binary(type_info: &MySqlTypeInfo, raw: &Bytes) -> Result<MySqlValue> {
    let ty = type_info.r#type;
    let unsigned = type_info.is_unsigned();
    let mut buf = raw.clone();

    macro_rules! need {
        ($n:expr, $what:expr) => {
            if buf.remaining() < $n {
                return Err(decode_err(ty, $what));
            }
        };
    }

    Ok(match ty {
        ColumnType::Null => MySqlValue::Null,

        ColumnType::Tiny => {
            need!(1, "1-byte integer");
            if unsigned {
                MySqlValue::UInt8(buf.get_u8())
            } else {
                MySqlValue::Int8(buf.get_i8())
            }
        }

        ColumnType::Short | ColumnType::Year => {
            need!(2, "2-byte integer");
            if unsigned || ty == ColumnType::Year {
                MySqlValue::UInt16(buf.get_u16_le())
            } else {
                MySqlValue::Int16(buf.get_i16_le())
            }
        }

        ColumnType::Long | ColumnType::Int24 => {
            need!(4, "4-byte integer");
            if unsigned {
                MySqlValue::UInt32(buf.get_u32_le())
            } else {
                MySqlValue::Int32(buf.get_i32_le())
            }
        }

        ColumnType::LongLong => {
            need!(8, "8-byte integer");
            if unsigned {
                MySqlValue::UInt64(buf.get_u64_le())
            } else {
                MySqlValue::Int64(buf.get_i64_le())
            }
        }

        ColumnType::Float => {
            need!(4, "float");
            MySqlValue::Float(buf.get_f32_le())
        }

        ColumnType::Double => {
            need!(8, "double");
            MySqlValue::Double(buf.get_f64_le())
        }

        ColumnType::Date | ColumnType::NewDate => {
            need!(1, "date length");
            let len = buf.get_u8();

            match len {
                0 => MySqlValue::Date(MySqlDate::default()),
                4 => {
                    let year = buf.get_u16_le();
                    MySqlValue::Date(MySqlDate { year, month: buf.get_u8(), day: buf.get_u8() })
                }
                _ => return Err(decode_err(ty, "date length")),
            }
        }

        ColumnType::Datetime | ColumnType::Datetime2 | ColumnType::Timestamp
        | ColumnType::Timestamp2 => {
            need!(1, "datetime length");
            let len = buf.get_u8();

            let mut dt = MySqlDateTime::default();

            if len >= 4 {
                dt.date =
                    MySqlDate { year: buf.get_u16_le(), month: buf.get_u8(), day: buf.get_u8() };
            }

            if len >= 7 {
                dt.hour = buf.get_u8();
                dt.minute = buf.get_u8();
                dt.second = buf.get_u8();
            }

            if len >= 11 {
                dt.micros = buf.get_u32_le();
            }

            if !matches!(len, 0 | 4 | 7 | 11) {
                return Err(decode_err(ty, "datetime length"));
            }

            MySqlValue::DateTime(dt)
        }

        ColumnType::Time | ColumnType::Time2 => {
            need!(1, "time length");
            let len = buf.get_u8();

            let mut time = MySqlTime::default();

            if len >= 8 {
                time.negative = buf.get_u8() != 0;
                time.days = buf.get_u32_le();
                time.hour = buf.get_u8();
                time.minute = buf.get_u8();
                time.second = buf.get_u8();
            }

            if len >= 12 {
                time.micros = buf.get_u32_le();
            }

            if !matches!(len, 0 | 8 | 12) {
                return Err(decode_err(ty, "time length"));
            }

            MySqlValue::Time(time)
        }

        ColumnType::Decimal | ColumnType::NewDecimal => {
            let s = std::str::from_utf8(&buf)
                .map_err(|_| decode_err(ty, "non-UTF-8 decimal"))?;

            MySqlValue::Decimal(s.to_owned())
        }

        // string and blob families arrive as the raw payload; the
        // length-encoded prefix was consumed during row decoding
        _ => MySqlValue::Bytes { data: raw.clone(), collation: type_info.collation },
    })
}

fn parse_date(ty: ColumnType, text: &str) -> Result<MySqlDate> {
    let mut parts = text.splitn(3, '-');

    let mut next = || -> Result<u16> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| decode_err(ty, "date"))
    };

    let year = next()?;
    let month = next()? as u8;
    let day = next()? as u8;

    Ok(MySqlDate { year, month, day })
}

fn parse_hms(ty: ColumnType, text: &str) -> Result<(u8, u8, u8, u32)> {
    let (clock, micros) = match text.split_once('.') {
        Some((clock, frac)) => {
            // fractional digits scale to microseconds
            let micros: u32 = frac.parse().map_err(|_| decode_err(ty, "time fraction"))?;
            (clock, micros * 10_u32.pow(6_u32.saturating_sub(frac.len() as u32)))
        }
        None => (text, 0),
    };

    let mut parts = clock.splitn(3, ':');
    let mut next = || -> Result<u8> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| decode_err(ty, "time"))
    };

    Ok((next()?, next()?, next()?, micros))
}

fn encode_date(buf: &mut Vec<u8>, date: &MySqlDate) {
    if *date == MySqlDate::default() {
        buf.push(0);
        return;
    }

    buf.push(4);
    buf.extend_from_slice(&date.year.to_le_bytes());
    buf.push(date.month);
    buf.push(date.day);
}

fn encode_datetime(buf: &mut Vec<u8>, dt: &MySqlDateTime) {
    if *dt == MySqlDateTime::default() {
        buf.push(0);
        return;
    }

    let len: u8 = if dt.micros != 0 {
        11
    } else if (dt.hour, dt.minute, dt.second) != (0, 0, 0) {
        7
    } else {
        4
    };

    buf.push(len);
    buf.extend_from_slice(&dt.date.year.to_le_bytes());
    buf.push(dt.date.month);
    buf.push(dt.date.day);

    if len >= 7 {
        buf.push(dt.hour);
        buf.push(dt.minute);
        buf.push(dt.second);
    }

    if len >= 11 {
        buf.extend_from_slice(&dt.micros.to_le_bytes());
    }
}

fn encode_time(buf: &mut Vec<u8>, time: &MySqlTime) {
    if *time == MySqlTime::default() {
        buf.push(0);
        return;
    }

    let len: u8 = if time.micros != 0 { 12 } else { 8 };

    buf.push(len);
    buf.push(time.negative as u8);
    buf.extend_from_slice(&time.days.to_le_bytes());
    buf.push(time.hour);
    buf.push(time.minute);
    buf.push(time.second);

    if len >= 12 {
        buf.extend_from_slice(&time.micros.to_le_bytes());
    }
}
