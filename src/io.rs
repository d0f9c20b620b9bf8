//! Little-endian cursor primitives used by every chunk codec (§6.2, §9).
//!
//! Replaces the macro-based read/write helpers of the original engine with
//! small typed methods that advance a cursor through a byte buffer. Built on
//! `byteorder` rather than hand-rolled shifting.

use byteorder::{ByteOrder, LittleEndian};

/// Appends little-endian primitives to a growing `Vec<u8>`.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        let mut bytes = [0u8; 2];
        LittleEndian::write_i16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(value);
        self
    }

    /// Writes a length-prefixed UTF-8 string: `u16 len; len bytes`.
    pub fn text(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        self.u16(bytes.len() as u16);
        self.bytes(bytes)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Overwrites 4 bytes already written at `offset` — used to back-patch
    /// the chunk header's `size` field once the tail is known.
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        LittleEndian::write_u32(&mut self.buf[offset..offset + 4], value);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads little-endian primitives from a byte slice, advancing an internal
/// cursor. All read methods panic on truncated input: a malformed chunk is
/// an internal consistency bug, not a recoverable condition (chunks are
/// produced exclusively by this crate's own encoders).
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        slice
    }

    pub fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    pub fn i16(&mut self) -> i16 {
        LittleEndian::read_i16(self.take(2))
    }

    pub fn u16(&mut self) -> u16 {
        LittleEndian::read_u16(self.take(2))
    }

    pub fn u32(&mut self) -> u32 {
        LittleEndian::read_u32(self.take(4))
    }

    pub fn bytes(&mut self, len: usize) -> &'a [u8] {
        self.take(len)
    }

    pub fn text(&mut self) -> String {
        let len = self.u16() as usize;
        String::from_utf8_lossy(self.take(len)).into_owned()
    }
}
