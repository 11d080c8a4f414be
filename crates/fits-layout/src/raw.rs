//! Uninterpreted byte payloads (`BITPIX = 8`, one axis).

use alloc::vec;
use alloc::vec::Vec;

use crate::data::Payload;
use crate::error::Result;
use crate::header::Header;
use crate::io::{Read, Write};

/// A data segment holding plain bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawData {
    bytes: Vec<u8>,
}

impl RawData {
    /// Wrap `bytes` as a data payload.
    pub fn new(bytes: Vec<u8>) -> Self {
        RawData { bytes }
    }

    /// A zero-filled payload of `len` bytes, ready to be read into.
    pub fn with_len(len: usize) -> Self {
        RawData {
            bytes: vec![0; len],
        }
    }

    /// The payload bytes, unpadded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable access to the bytes; the length may change.
    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    /// Consume the payload, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Payload for RawData {
    fn true_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn write_payload<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.bytes)?;
        Ok(())
    }

    fn read_payload<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<()> {
        input.read_exact(&mut self.bytes)?;
        Ok(())
    }

    /// Describes the bytes as a one-dimensional 8-bit array, or as an empty
    /// array when there are none.
    fn fill_header(&self, header: &mut Header) -> Result<()> {
        header.set_integer("BITPIX", 8, Some("array data type"))?;
        let axes = if self.bytes.is_empty() { 0 } else { 1 };
        header.set_integer("NAXIS", axes, Some("number of array dimensions"))?;
        if axes == 0 {
            header.remove("NAXIS1");
        } else {
            header.set_integer("NAXIS1", self.bytes.len() as i64, None)?;
        }
        Ok(())
    }
}
