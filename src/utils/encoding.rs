use crate::error::ParseError;

/// Bounds-checked little-endian reader over a byte slice
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current offset
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `len` bytes, or report which field did not fit
    pub fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ParseError> {
        if len > self.remaining() {
            return Err(ParseError::Truncated {
                field,
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a u32 in little-endian format
    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32, ParseError> {
        let bytes = self.take(4, field)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a u64 in little-endian format
    pub fn read_u64_le(&mut self, field: &'static str) -> Result<u64, ParseError> {
        let bytes = self.take(8, field)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }
}

/// Append a u32 in little-endian format
pub fn put_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append a u64 in little-endian format
pub fn put_u64_le(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_reads_le() {
        let mut buf = Vec::new();
        put_u32_le(&mut buf, 0xDEADBEEF);
        put_u64_le(&mut buf, 1 << 40);

        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_u32_le("a").unwrap(), 0xDEADBEEF);
        assert_eq!(cursor.read_u64_le("b").unwrap(), 1 << 40);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_cursor_truncated() {
        let buf = [1u8, 2, 3];
        let mut cursor = ByteCursor::new(&buf);
        let err = cursor.read_u32_le("grid_width").unwrap_err();
        assert_eq!(
            err,
            ParseError::Truncated {
                field: "grid_width",
                offset: 0,
                needed: 4,
                available: 3,
            }
        );
        // failed read does not advance
        assert_eq!(cursor.position(), 0);
    }
}
