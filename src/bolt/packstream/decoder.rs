//! PackStream decoder.

use std::collections::HashMap;

use super::marker::*;
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// Reads PackStream values from a byte slice.
pub struct PackStreamDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PackStreamDecoder<'a> {
    /// Create a decoder over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether all input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<PackStreamValue, PackStreamError> {
        let marker = self.read_u8()?;

        match marker {
            NULL => Ok(PackStreamValue::Null),
            TRUE => Ok(PackStreamValue::Boolean(true)),
            FALSE => Ok(PackStreamValue::Boolean(false)),

            FLOAT_64 => Ok(PackStreamValue::Float(f64::from_bits(
                self.read_be(8)? as u64
            ))),

            INT_8 => Ok(PackStreamValue::Integer(self.read_be(1)? as i8 as i64)),
            INT_16 => Ok(PackStreamValue::Integer(self.read_be(2)? as i16 as i64)),
            INT_32 => Ok(PackStreamValue::Integer(self.read_be(4)? as i32 as i64)),
            INT_64 => Ok(PackStreamValue::Integer(self.read_be(8)? as i64)),

            BYTES_8 | BYTES_16 | BYTES_32 => {
                let len = self.read_len_for(marker, BYTES_8)?;
                Ok(PackStreamValue::Bytes(self.read_slice(len)?.to_vec()))
            }

            STRING_8 | STRING_16 | STRING_32 => {
                let len = self.read_len_for(marker, STRING_8)?;
                self.read_string(len)
            }

            LIST_8 | LIST_16 | LIST_32 => {
                let len = self.read_len_for(marker, LIST_8)?;
                self.read_list(len)
            }

            MAP_8 | MAP_16 | MAP_32 => {
                let len = self.read_len_for(marker, MAP_8)?;
                self.read_map(len)
            }

            STRUCT_8 => {
                let len = self.read_be(1)? as usize;
                self.read_structure(len)
            }
            STRUCT_16 => {
                let len = self.read_be(2)? as usize;
                self.read_structure(len)
            }

            m if is_tiny_string(m) => self.read_string(tiny_size(m)),
            m if is_tiny_list(m) => self.read_list(tiny_size(m)),
            m if is_tiny_map(m) => self.read_map(tiny_size(m)),
            m if is_tiny_struct(m) => self.read_structure(tiny_size(m)),
            m if is_tiny_int(m) => Ok(PackStreamValue::Integer(decode_tiny_int(m) as i64)),

            m => Err(PackStreamError::UnknownMarker(m)),
        }
    }

    /// Length field for an 8/16/32-bit sized marker family, where
    /// `base` is the 8-bit member.
    fn read_len_for(&mut self, marker: u8, base: u8) -> Result<usize, PackStreamError> {
        let width = 1usize << (marker - base);
        Ok(self.read_be(width)? as usize)
    }

    fn read_string(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        let bytes = self.read_slice(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))?;
        Ok(PackStreamValue::String(s.to_string()))
    }

    fn read_list(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(PackStreamValue::List(items))
    }

    fn read_map(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        let mut map = HashMap::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = match self.decode()? {
                PackStreamValue::String(s) => s,
                _ => return Err(PackStreamError::InvalidMapKey),
            };
            let value = self.decode()?;
            map.insert(key, value);
        }
        Ok(PackStreamValue::Map(map))
    }

    fn read_structure(&mut self, field_count: usize) -> Result<PackStreamValue, PackStreamError> {
        let tag = self.read_u8()?;
        let mut fields = Vec::with_capacity(field_count.min(64));
        for _ in 0..field_count {
            fields.push(self.decode()?);
        }
        Ok(PackStreamValue::Structure(PackStreamStructure::new(
            tag, fields,
        )))
    }

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        if self.remaining() < 1 {
            return Err(PackStreamError::UnexpectedEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Read `width` bytes (1, 2, 4 or 8) as a big-endian unsigned value.
    fn read_be(&mut self, width: usize) -> Result<u128, PackStreamError> {
        let bytes = self.read_slice(width)?;
        let mut value = 0u128;
        for b in bytes {
            value = (value << 8) | *b as u128;
        }
        Ok(value)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], PackStreamError> {
        if self.remaining() < len {
            return Err(PackStreamError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

/// Decode a single value from bytes.
pub fn decode(data: &[u8]) -> Result<PackStreamValue, PackStreamError> {
    let mut decoder = PackStreamDecoder::new(data);
    decoder.decode()
}
