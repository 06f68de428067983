//! Little-endian cursor over a QBT byte stream
//!
//! Every read is bounds-checked and reports the offset it failed at, so the
//! parser never indexes past the end of the input.

use super::QbtError;
use glam::{IVec3, UVec3, Vec3};

/// Sequential reader over borrowed QBT bytes
pub struct QbtReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> QbtReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current byte offset from the start of the stream
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], QbtError> {
        if len > self.remaining() {
            return Err(QbtError::TruncatedData {
                offset: self.offset,
                expected_bytes: len,
                available_bytes: self.remaining(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], QbtError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, QbtError> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32, QbtError> {
        self.read_array().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32_le(&mut self) -> Result<i32, QbtError> {
        self.read_array().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn read_f32_le(&mut self) -> Result<f32, QbtError> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_ivec3(&mut self) -> Result<IVec3, QbtError> {
        Ok(IVec3::new(
            self.read_i32_le()?,
            self.read_i32_le()?,
            self.read_i32_le()?,
        ))
    }

    pub fn read_uvec3(&mut self) -> Result<UVec3, QbtError> {
        Ok(UVec3::new(
            self.read_u32_le()?,
            self.read_u32_le()?,
            self.read_u32_le()?,
        ))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, QbtError> {
        Ok(Vec3::new(
            self.read_f32_le()?,
            self.read_f32_le()?,
            self.read_f32_le()?,
        ))
    }

    /// Read an 8-byte section caption and compare it against `expected`
    pub fn expect_caption(&mut self, expected: &'static [u8; 8]) -> Result<(), QbtError> {
        let offset = self.offset;
        let found = self.read_bytes(expected.len())?;
        if found != expected {
            return Err(QbtError::InvalidCaption {
                expected: std::str::from_utf8(expected).unwrap_or("<caption>"),
                found: String::from_utf8_lossy(found).into_owned(),
                offset,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let bytes = [0x51, 0x42, 0x20, 0x32, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80, 0x3F];
        let mut reader = QbtReader::new(&bytes);

        assert_eq!(reader.read_u32_le().unwrap(), 0x3220_4251);
        assert_eq!(reader.read_i32_le().unwrap(), -1);
        assert_eq!(reader.read_f32_le().unwrap(), 1.0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let bytes = [1, 2, 3, 4, 5, 6];
        let mut reader = QbtReader::new(&bytes);
        reader.read_u32_le().unwrap();

        match reader.read_u32_le().unwrap_err() {
            QbtError::TruncatedData {
                offset,
                expected_bytes,
                available_bytes,
            } => {
                assert_eq!(offset, 4);
                assert_eq!(expected_bytes, 4);
                assert_eq!(available_bytes, 2);
            }
            other => panic!("expected TruncatedData, got {other:?}"),
        }
    }

    #[test]
    fn test_caption_mismatch() {
        let mut reader = QbtReader::new(b"COLORMAX");
        match reader.expect_caption(b"COLORMAP").unwrap_err() {
            QbtError::InvalidCaption { found, offset, .. } => {
                assert_eq!(found, "COLORMAX");
                assert_eq!(offset, 0);
            }
            other => panic!("expected InvalidCaption, got {other:?}"),
        }
    }

    #[test]
    fn test_vectors() {
        let mut bytes = Vec::new();
        for v in [1i32, -2, 3] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [4u32, 5, 6] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut reader = QbtReader::new(&bytes);

        assert_eq!(reader.read_ivec3().unwrap(), IVec3::new(1, -2, 3));
        assert_eq!(reader.read_uvec3().unwrap(), UVec3::new(4, 5, 6));
        assert_eq!(reader.position(), 24);
    }
}
