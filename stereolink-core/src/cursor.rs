//! Bounds-checked byte cursors
//!
//! All record and frame codecs go through [`ByteReader`] / [`ByteWriter`]
//! instead of raw offset arithmetic, so a malformed layout surfaces as an
//! explicit [`Error::BufferOverrun`](crate::Error::BufferOverrun) rather
//! than reading someone else's bytes.
//!
//! Conventions shared by every codec in this workspace:
//!
//! - multi-byte integers are little-endian, no sign extension
//! - floating-point fields are 8 raw bytes, a verbatim little-endian
//!   image of the binary64 bit pattern (NaN/Inf pass through unchanged)
//! - string fields are fixed-width, right-padded with spaces on encode
//!   and right-trimmed on decode

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Read cursor over an immutable byte slice
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::BufferOverrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip `n` bytes without interpreting them
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    /// Read a double as its raw binary64 bit pattern
    ///
    /// No numeric validation: NaN and infinity decode as themselves.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(LittleEndian::read_u64(self.take(8)?)))
    }

    /// Read a fixed-width string slot, trimming the trailing space padding
    pub fn read_string(&mut self, width: usize) -> Result<String> {
        let raw = self.take(width)?;
        Ok(String::from_utf8_lossy(raw).trim_end().to_string())
    }
}

/// Write cursor over a mutable byte slice
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to write
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.remaining() {
            return Err(Error::BufferOverrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &mut self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Zero-fill `n` bytes (reserved gaps in fixed layouts)
    pub fn pad(&mut self, n: usize) -> Result<()> {
        self.reserve(n)?.fill(0);
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        LittleEndian::write_u16(self.reserve(2)?, value);
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        LittleEndian::write_u32(self.reserve(4)?, value);
        Ok(())
    }

    pub fn put_i16(&mut self, value: i16) -> Result<()> {
        LittleEndian::write_i16(self.reserve(2)?, value);
        Ok(())
    }

    /// Write a double as its raw binary64 bit pattern
    pub fn put_f64(&mut self, value: f64) -> Result<()> {
        LittleEndian::write_u64(self.reserve(8)?, value.to_bits());
        Ok(())
    }

    /// Write a string into a fixed-width slot, right-padded with spaces
    ///
    /// Fails if the text does not fit; callers validate lengths up front.
    pub fn put_string(&mut self, text: &str, width: usize) -> Result<()> {
        if text.len() > width {
            return Err(Error::StringTooLong {
                len: text.len(),
                capacity: width,
            });
        }
        let slot = self.reserve(width)?;
        slot[..text.len()].copy_from_slice(text.as_bytes());
        slot[text.len()..].fill(b' ');
        Ok(())
    }
}
