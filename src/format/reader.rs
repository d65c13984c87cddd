//! Bounds-checked little-endian byte cursors.

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};

/// Reads little-endian values from a byte slice. Every read checks the
/// remaining length and fails with [`Error::Truncated`].
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.bytes(N)?);
        Ok(buf)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    pub fn vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    /// Packed `0x00BBGGRR` color as 0..1 components.
    pub fn rgb(&mut self) -> Result<Vec3> {
        let [r, g, b, _] = self.array::<4>()?;
        Ok(Vec3::new(r as f32, g as f32, b as f32) / 255.0)
    }

    /// NUL-padded string in a fixed-size field.
    pub fn fixed_string(&mut self, len: usize) -> Result<String> {
        let raw = self.bytes(len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    /// Length-prefixed string: a `u8` length, or `0xFF` followed by a
    /// `u16` length. Strings longer than `max` are skipped and read as
    /// empty.
    pub fn string(&mut self, max: usize) -> Result<String> {
        let len = match self.u8()? {
            0xFF => self.u16()? as usize,
            len => len as usize,
        };
        self.sized_string(len, max)
    }

    /// String with a `u16` length prefix.
    pub fn long_string(&mut self, max: usize) -> Result<String> {
        let len = self.u16()? as usize;
        self.sized_string(len, max)
    }

    fn sized_string(&mut self, len: usize, max: usize) -> Result<String> {
        let offset = self.pos;
        let raw = self.bytes(len)?;
        if len > max {
            log::warn!("Skipping {} byte string at offset {} (limit {})", len, offset, max);
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

/// Builds little-endian output.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.bytes(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.bytes(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.bytes(&v.to_le_bytes());
    }

    pub fn f64(&mut self, v: f64) {
        self.bytes(&v.to_le_bytes());
    }

    pub fn vec3(&mut self, v: Vec3) {
        self.f32(v.x);
        self.f32(v.y);
        self.f32(v.z);
    }

    pub fn rgb(&mut self, color: Vec3) {
        let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        self.bytes(&[c.x as u8, c.y as u8, c.z as u8, 0]);
    }

    /// NUL-padded, truncated to fit `len` with a terminator.
    pub fn fixed_string(&mut self, s: &str, len: usize) {
        let mut field = vec![0u8; len];
        let bytes = s.as_bytes();
        let n = bytes.len().min(len.saturating_sub(1));
        field[..n].copy_from_slice(&bytes[..n]);
        self.bytes(&field);
    }

    /// Counterpart of [`ByteReader::string`].
    pub fn string(&mut self, s: &str) {
        let bytes = &s.as_bytes()[..s.len().min(u16::MAX as usize)];
        if bytes.len() < 0xFF {
            self.u8(bytes.len() as u8);
        } else {
            self.u8(0xFF);
            self.u16(bytes.len() as u16);
        }
        self.bytes(bytes);
    }

    pub fn long_string(&mut self, s: &str) {
        let bytes = &s.as_bytes()[..s.len().min(u16::MAX as usize)];
        self.u16(bytes.len() as u16);
        self.bytes(bytes);
    }
}
