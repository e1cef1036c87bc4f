use bytes::{Buf, Bytes};
use memchr::memchr;

use crate::error::{err_protocol, Error, Result};

/// Reads for the protocol's basic string shapes: NUL-terminated,
/// fixed-length, and end-of-packet.
pub trait BufExt: Buf {
    /// Read bytes up to (and consuming, but not returning) the next `0x00`.
    fn get_bytes_nul(&mut self) -> Result<Bytes>;

    /// Read exactly `len` bytes.
    fn get_bytes(&mut self, len: usize) -> Result<Bytes>;

    /// Read a UTF-8 string up to (and consuming) the next `0x00`.
    fn get_str_nul(&mut self) -> Result<String>;

    /// Read a UTF-8 string of exactly `len` bytes.
    fn get_str(&mut self, len: usize) -> Result<String>;

    /// Read the rest of the packet as a UTF-8 string.
    fn get_str_eof(&mut self) -> Result<String>;
}

/// Reads for the protocol's length-encoded integer and string shapes.
///
/// <https://dev.mysql.com/doc/internals/en/integer.html#packet-Protocol::LengthEncodedInteger>
pub trait MySqlBufExt: BufExt {
    /// Read a length-encoded integer.
    ///
    /// NOTE: The first byte of a length-encoded integer in ordinary data is
    /// never `0xfb` (NULL, text rows only) nor `0xff` (ERR sentinel); both
    /// are rejected by the callers that can encounter them.
    fn get_uint_lenenc(&mut self) -> Result<u64>;

    /// Read a length-encoded byte sequence.
    fn get_bytes_lenenc(&mut self) -> Result<Bytes>;

    /// Read a length-encoded UTF-8 string.
    fn get_str_lenenc(&mut self) -> Result<String>;
}

fn str_from(bytes: Bytes) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| err_protocol!("string is not valid UTF-8"))
}

impl BufExt for Bytes {
    fn get_bytes_nul(&mut self) -> Result<Bytes> {
        let nul = memchr(b'\0', self)
            .ok_or_else(|| err_protocol!("expected NUL terminator in string"))?;

        let bytes = self.split_to(nul);
        self.advance(1);

        Ok(bytes)
    }

    fn get_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.remaining() < len {
            return Err(err_protocol!(
                "packet truncated: expected {len} more bytes, found {}",
                self.remaining()
            ));
        }

        Ok(self.split_to(len))
    }

    fn get_str_nul(&mut self) -> Result<String> {
        self.get_bytes_nul().and_then(str_from)
    }

    fn get_str(&mut self, len: usize) -> Result<String> {
        self.get_bytes(len).and_then(str_from)
    }

    fn get_str_eof(&mut self) -> Result<String> {
        let all = self.split_to(self.len());
        str_from(all)
    }
}

impl MySqlBufExt for Bytes {
    fn get_uint_lenenc(&mut self) -> Result<u64> {
        if self.is_empty() {
            return Err(err_protocol!("packet truncated: expected length-encoded integer"));
        }

        Ok(match self.get_u8() {
            0xfc => u64::from(self.get_u16_le()),
            0xfd => self.get_uint_le(3),
            0xfe => self.get_u64_le(),

            v @ 0xfb | v @ 0xff => {
                return Err(err_protocol!(
                    "unexpected 0x{v:02x} at the start of a length-encoded integer"
                ));
            }

            v => u64::from(v),
        })
    }

    fn get_bytes_lenenc(&mut self) -> Result<Bytes> {
        let len = self.get_uint_lenenc()?;
        let len = usize::try_from(len)
            .map_err(|_| err_protocol!("string length out of range: {len}"))?;

        self.get_bytes(len)
    }

    fn get_str_lenenc(&mut self) -> Result<String> {
        self.get_bytes_lenenc().and_then(str_from)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::{BufExt, MySqlBufExt};

    #[test]
    fn reads_lenenc_widths() {
        let mut buf = Bytes::from_static(&[0x00]);
        assert_eq!(buf.get_uint_lenenc().unwrap(), 0);

        let mut buf = Bytes::from_static(&[0xfa]);
        assert_eq!(buf.get_uint_lenenc().unwrap(), 0xfa);

        let mut buf = Bytes::from_static(&[0xfc, 0xfb, 0x00]);
        assert_eq!(buf.get_uint_lenenc().unwrap(), 0xfb);

        let mut buf = Bytes::from_static(&[0xfd, 0x01, 0x00, 0x01]);
        assert_eq!(buf.get_uint_lenenc().unwrap(), 0x01_00_01);

        let mut buf = Bytes::from_static(&[0xfe, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(buf.get_uint_lenenc().unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn rejects_reserved_lenenc_tags() {
        for tag in [0xfb_u8, 0xff] {
            let mut buf = Bytes::copy_from_slice(&[tag]);
            assert!(buf.get_uint_lenenc().is_err());
        }
    }

    #[test]
    fn reads_nul_terminated() {
        let mut buf = Bytes::from_static(b"mysql_native_password\0rest");
        assert_eq!(buf.get_str_nul().unwrap(), "mysql_native_password");
        assert_eq!(&buf[..], b"rest");
    }

    #[test]
    fn nul_missing_is_an_error() {
        let mut buf = Bytes::from_static(b"no terminator");
        assert!(buf.get_str_nul().is_err());
    }

    #[test]
    fn truncated_fixed_read_is_an_error() {
        let mut buf = Bytes::from_static(b"abc");
        assert!(buf.get_bytes(4).is_err());
    }
}
