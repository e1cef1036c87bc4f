/// Writes for the protocol's basic string shapes.
pub trait BufMutExt {
    fn put_str_nul(&mut self, s: &str);
}

/// Writes for the protocol's length-encoded integer and string shapes.
pub trait MySqlBufMutExt: BufMutExt {
    /// Write a length-encoded integer in its shortest valid width.
    fn put_uint_lenenc(&mut self, value: u64);

    /// Write a length-encoded byte sequence.
    fn put_bytes_lenenc(&mut self, bytes: &[u8]);

    /// Write a length-encoded string.
    fn put_str_lenenc(&mut self, s: &str);
}

impl BufMutExt for Vec<u8> {
    fn put_str_nul(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
        self.push(0);
    }
}

impl MySqlBufMutExt for Vec<u8> {
    fn put_uint_lenenc(&mut self, value: u64) {
        match value {
            0..=0xfa => self.push(value as u8),

            0xfb..=0xffff => {
                self.push(0xfc);
                self.extend_from_slice(&(value as u16).to_le_bytes());
            }

            0x1_0000..=0xff_ffff => {
                self.push(0xfd);
                self.extend_from_slice(&value.to_le_bytes()[..3]);
            }

            _ => {
                self.push(0xfe);
                self.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    fn put_bytes_lenenc(&mut self, bytes: &[u8]) {
        self.put_uint_lenenc(bytes.len() as u64);
        self.extend_from_slice(bytes);
    }

    fn put_str_lenenc(&mut self, s: &str) {
        self.put_bytes_lenenc(s.as_bytes());
    }
}
