//! Seekable endian-tagged reader over an in-memory buffer.
//!
//! RMHG directory words are little-endian while the CGMG and GCT0 payloads
//! inside the same file are big-endian, so the active endianness is carried
//! as cursor state and can be switched mid-parse.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order of multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// A seekable binary reader over a fixed byte slice.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endianness,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at offset 0 with the given byte order.
    #[must_use]
    pub fn new(data: &'a [u8], endian: Endianness) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    /// Total buffer length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current absolute offset.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Bytes left between the current offset and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        (self.data.len() - self.pos) as u64
    }

    /// The active byte order.
    #[must_use]
    pub fn endian(&self) -> Endianness {
        self.endian
    }

    /// Switch the byte order for subsequent reads.
    pub fn set_endian(&mut self, endian: Endianness) {
        self.endian = endian;
    }

    /// Seek to an absolute offset. Seeking to the end of the buffer is
    /// allowed; past it is an error.
    pub fn seek(&mut self, target: u64) -> Result<()> {
        if target > self.data.len() as u64 {
            return Err(Error::SeekOutOfRange {
                target,
                len: self.data.len(),
            });
        }
        self.pos = target as usize;
        Ok(())
    }

    /// Seek relative to the current offset.
    pub fn seek_relative(&mut self, delta: i64) -> Result<()> {
        let target = self.pos as i64 + delta;
        if target < 0 {
            return Err(Error::SeekOutOfRange {
                target: 0,
                len: self.data.len(),
            });
        }
        self.seek(target as u64)
    }

    /// Borrow `[start, end)` of the underlying buffer.
    pub fn slice(&self, start: u64, end: u64) -> Result<&'a [u8]> {
        if start > end || end > self.data.len() as u64 {
            return Err(Error::SeekOutOfRange {
                target: end,
                len: self.data.len(),
            });
        }
        Ok(&self.data[start as usize..end as usize])
    }

    /// Borrow everything from `start` to the end of the buffer.
    pub fn slice_from(&self, start: u64) -> Result<&'a [u8]> {
        self.slice(start, self.data.len() as u64)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|e| *e <= self.data.len());
        let Some(end) = end else {
            return Err(Error::UnexpectedEof {
                offset: self.pos as u64,
            });
        };
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(match self.endian {
            Endianness::Little => LittleEndian::read_u16(bytes),
            Endianness::Big => BigEndian::read_u16(bytes),
        })
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(match self.endian {
            Endianness::Little => LittleEndian::read_u32(bytes),
            Endianness::Big => BigEndian::read_u32(bytes),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read a fixed-length ASCII tag, truncated at the first NUL. A tag
    /// containing non-ASCII bytes reads as an empty string rather than an
    /// error, matching how unrecognized records are probed.
    pub fn read_tag(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        let head = &bytes[..end];
        if head.is_ascii() {
            Ok(String::from_utf8_lossy(head).into_owned())
        } else {
            Ok(String::new())
        }
    }

    /// Read a NUL-terminated string from the current offset. Reading stops
    /// at the end of the buffer if no terminator is found.
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        let end = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
        let s = String::from_utf8_lossy(&rest[..end]).into_owned();
        // Consume the terminator too when present.
        self.pos += end + usize::from(end < rest.len());
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endian_tagged_reads() {
        let data = [0x12, 0x34, 0x56, 0x78];
        let mut cur = ByteCursor::new(&data, Endianness::Little);
        assert_eq!(cur.read_u32().unwrap(), 0x78563412);
        cur.seek(0).unwrap();
        cur.set_endian(Endianness::Big);
        assert_eq!(cur.read_u32().unwrap(), 0x12345678);
        cur.seek(2).unwrap();
        assert_eq!(cur.read_u16().unwrap(), 0x5678);
    }

    #[test]
    fn float_reads_follow_endianness() {
        let bits = 1.5f32.to_be_bytes();
        let mut cur = ByteCursor::new(&bits, Endianness::Big);
        assert!((cur.read_f32().unwrap() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn tag_truncates_at_nul_and_rejects_non_ascii() {
        let data = *b"RMHG\0\0\0\0";
        let mut cur = ByteCursor::new(&data, Endianness::Little);
        assert_eq!(cur.read_tag(8).unwrap(), "RMHG");

        let junk = [0xFF, 0xFE, 0x41, 0x42];
        let mut cur = ByteCursor::new(&junk, Endianness::Little);
        assert_eq!(cur.read_tag(4).unwrap(), "");
    }

    #[test]
    fn cstring_consumes_terminator() {
        let data = *b"model\0rest";
        let mut cur = ByteCursor::new(&data, Endianness::Big);
        assert_eq!(cur.read_cstring().unwrap(), "model");
        assert_eq!(cur.position(), 6);
    }

    #[test]
    fn reads_past_end_fail() {
        let data = [0u8; 3];
        let mut cur = ByteCursor::new(&data, Endianness::Little);
        assert!(cur.read_u32().is_err());
        assert!(cur.seek(4).is_err());
        assert!(cur.seek(3).is_ok());
    }
}
