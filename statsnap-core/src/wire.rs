/*!
Primitive wire encodings shared by every chunk.

- varint: LEB128 of the 32-bit two's-complement value, at most 5 bytes
- string: varint byte length followed by UTF-8 bytes
- flag: one byte, non-zero is true
- UUID: 16 bytes, most significant half first
*/

use crate::{Result, StatsError};
use bytes::{Buf, BufMut};
use uuid::Uuid;

/// Longest legal varint encoding of a 32-bit value
pub const MAX_VARINT_BYTES: usize = 5;

/// Write-side helpers for any [`BufMut`].
pub trait WireWrite: BufMut {
    fn put_varint(&mut self, value: i32) {
        let mut remaining = value as u32;
        loop {
            if remaining & !0x7f == 0 {
                self.put_u8(remaining as u8);
                return;
            }
            self.put_u8((remaining & 0x7f) as u8 | 0x80);
            remaining >>= 7;
        }
    }

    fn put_utf(&mut self, value: &str) {
        self.put_varint(value.len() as i32);
        self.put_slice(value.as_bytes());
    }

    fn put_flag(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    fn put_uuid(&mut self, value: &Uuid) {
        self.put_slice(value.as_bytes());
    }
}

impl<B: BufMut + ?Sized> WireWrite for B {}

/// Bounds-checked reader over a borrowed byte window.
///
/// Every read that would run past the window fails with
/// [`StatsError::TruncatedArchive`] instead of panicking.
#[derive(Debug, Clone, Copy)]
pub struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(StatsError::TruncatedArchive {
                expected: needed,
                actual: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u16_le(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn get_i32_le(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn get_i64_le(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn get_varint(&mut self) -> Result<i32> {
        let mut value: u32 = 0;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.get_u8()?;
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value as i32);
            }
        }
        Err(StatsError::OversizedField {
            field: "varint",
            size: MAX_VARINT_BYTES + 1,
            limit: MAX_VARINT_BYTES,
        })
    }

    pub fn get_flag(&mut self) -> Result<bool> {
        Ok(self.get_u8()? != 0)
    }

    pub fn get_uuid(&mut self) -> Result<Uuid> {
        let bytes = self.get_bytes(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(bytes);
        Ok(Uuid::from_bytes(raw))
    }

    /// Read a length-prefixed string of at most `limit` bytes.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn get_utf(&mut self, field: &'static str, limit: usize) -> Result<String> {
        // negative lengths wrap to huge sizes and trip the limit
        let size = self.get_varint()? as u32 as usize;
        if size > limit {
            return Err(StatsError::OversizedField { field, size, limit });
        }
        let bytes = self.get_bytes(size)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Split off the next `len` bytes as an independent reader
    pub fn split_to(&mut self, len: usize) -> Result<WireReader<'a>> {
        Ok(WireReader::new(self.get_bytes(len)?))
    }

    pub fn rest(&self) -> &'a [u8] {
        self.buf
    }
}
