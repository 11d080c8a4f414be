//! Tracking where a data segment lives on a random-access medium, and
//! rewriting it in place when that is safe.
//!
//! A FITS file has no relocation mechanism: each HDU starts where the padded
//! footprint of the previous one ends. A segment that was read from, or first
//! written to, a medium may therefore only be written back at the same offset
//! if its current payload still fills exactly as many 2880-byte blocks as it
//! did then. [`Segment`] records the offset and footprint at the moment of
//! binding and refuses any rewrite that would break that invariant, before a
//! single byte reaches the medium.
//!
//! The medium is never stored. Each operation borrows it, so a segment cannot
//! outlive or close the file it points into.

use log::{debug, warn};

use crate::block::{blocks_needed, padded_byte_len, padding_len, write_padding, DATA_PAD_BYTE};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::{stream_position, Read, Seek, SeekFrom, Write};

/// The data-kind specific half of a segment: how many bytes the payload
/// occupies and how to move them to and from a medium.
pub trait Payload {
    /// Exact, unpadded byte length of the in-memory payload.
    fn true_size(&self) -> u64;

    /// Write exactly [`true_size`](Self::true_size) bytes. Block padding is
    /// added by the segment.
    fn write_payload<W: Write + ?Sized>(&self, out: &mut W) -> Result<()>;

    /// Read the payload from `input`, which is positioned at its first byte.
    /// The segment moves the medium to the next block boundary afterwards.
    fn read_payload<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<()>;

    /// Filler byte written between the payload and the block boundary.
    fn pad_byte(&self) -> u8 {
        DATA_PAD_BYTE
    }

    /// Point `header` at this payload by setting the structural keywords
    /// that describe its shape.
    fn fill_header(&self, header: &mut Header) -> Result<()>;

    /// True size rounded up to a whole number of blocks.
    fn padded_size(&self) -> u64 {
        padded_byte_len(self.true_size())
    }
}

/// Where a segment was last positioned, and the footprint it had there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Byte offset of the segment's first byte on the medium.
    pub offset: u64,
    /// Padded size in bytes (a multiple of the block size) at binding time.
    pub data_size: u64,
}

impl Binding {
    /// Number of blocks recorded at binding time.
    pub fn blocks(&self) -> u64 {
        blocks_needed(self.data_size)
    }
}

/// A payload together with the medium position it was last read from or
/// written to.
#[derive(Debug, Clone)]
pub struct Segment<P> {
    payload: P,
    binding: Option<Binding>,
}

impl<P: Payload> Segment<P> {
    /// An unbound segment around `payload`.
    pub fn new(payload: P) -> Self {
        Segment {
            payload,
            binding: None,
        }
    }

    /// The payload this segment lays out.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutable access to the payload. Changing its size may make the
    /// segment no longer rewriteable.
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Consume the segment, dropping its binding.
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Offset and footprint recorded at the last binding, if any.
    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    /// Offset the segment was last positioned at, or `None` if never.
    pub fn file_offset(&self) -> Option<u64> {
        self.binding.map(|b| b.offset)
    }

    /// Padded footprint recorded at the last binding.
    pub fn data_size(&self) -> Option<u64> {
        self.binding.map(|b| b.data_size)
    }

    /// Canonical on-medium size: the true size padded to whole blocks.
    pub fn padded_size(&self) -> u64 {
        self.payload.padded_size()
    }

    /// Record that the segment starts at `offset`, with the footprint of
    /// the current payload.
    pub fn bind_at(&mut self, offset: u64) {
        let binding = Binding {
            offset,
            data_size: self.payload.padded_size(),
        };
        debug!(
            "binding segment at offset {} ({} blocks)",
            binding.offset,
            binding.blocks()
        );
        self.binding = Some(binding);
    }

    /// Bind to the current position of `medium`, which must be at the
    /// segment's first byte.
    ///
    /// If the medium cannot report its position the segment is left unbound.
    pub fn bind<M: Seek + ?Sized>(&mut self, medium: &mut M) -> Result<()> {
        match stream_position(medium) {
            Ok(offset) => {
                self.bind_at(offset);
                Ok(())
            }
            Err(e) => {
                self.binding = None;
                Err(e.into())
            }
        }
    }

    /// Whether the current payload may be written back over its old location.
    ///
    /// Requires a binding, and the current payload must occupy exactly the
    /// number of blocks recorded at binding time.
    pub fn is_rewriteable(&self) -> bool {
        match self.binding {
            Some(binding) => blocks_needed(self.payload.true_size()) == binding.blocks(),
            None => false,
        }
    }

    /// Serialize payload and block padding to `out` without binding.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        self.payload.write_payload(out)?;
        write_padding(
            out,
            padding_len(self.payload.true_size()),
            self.payload.pad_byte(),
        )?;
        Ok(())
    }

    /// Write the segment at the current position of `medium` and bind it there.
    pub fn write<M: Write + Seek + ?Sized>(&mut self, medium: &mut M) -> Result<()> {
        let offset = stream_position(medium)?;
        self.write_to(medium)?;
        self.bind_at(offset);
        Ok(())
    }

    /// Read the payload starting at the current position of `medium`, leave
    /// the medium at the next block boundary, and bind the segment.
    pub fn read<M: Read + Seek + ?Sized>(&mut self, medium: &mut M) -> Result<()> {
        let offset = stream_position(medium)?;
        self.payload.read_payload(medium)?;
        medium.seek(SeekFrom::Start(offset + self.payload.padded_size()))?;
        self.bind_at(offset);
        Ok(())
    }

    /// Overwrite the segment in place with the current payload, then flush.
    ///
    /// Fails with [`Error::IllegalRewrite`] without touching the medium if
    /// [`is_rewriteable`](Self::is_rewriteable) is false. Medium failures are
    /// reported as [`Error::RewriteIo`]; bytes already written stay written.
    /// On success the medium is left just past the segment.
    pub fn rewrite<M: Write + Seek + ?Sized>(&mut self, medium: &mut M) -> Result<()> {
        let binding = match self.binding {
            Some(binding) if self.is_rewriteable() => binding,
            Some(binding) => {
                warn!(
                    "refusing rewrite at offset {}: payload needs {} blocks, {} recorded",
                    binding.offset,
                    blocks_needed(self.payload.true_size()),
                    binding.blocks()
                );
                return Err(Error::IllegalRewrite);
            }
            None => {
                warn!("refusing rewrite of a segment that was never positioned");
                return Err(Error::IllegalRewrite);
            }
        };

        medium
            .seek(SeekFrom::Start(binding.offset))
            .map_err(Error::RewriteIo)?;
        self.write_to(medium).map_err(Error::during_rewrite)?;
        medium.flush().map_err(Error::RewriteIo)?;
        debug!(
            "rewrote {} bytes at offset {}",
            self.payload.true_size(),
            binding.offset
        );
        Ok(())
    }

    /// Best-effort move of `medium` back to the start of the segment.
    ///
    /// Returns `false` if the segment is unbound or the seek fails; the
    /// failure is not propagated.
    pub fn reset_position<M: Seek + ?Sized>(&self, medium: &mut M) -> bool {
        let Some(binding) = self.binding else {
            debug!("cannot reset position of an unbound segment");
            return false;
        };
        match medium.seek(SeekFrom::Start(binding.offset)) {
            Ok(_) => true,
            Err(e) => {
                debug!("failed to reset position to {}: {}", binding.offset, e);
                false
            }
        }
    }
}
