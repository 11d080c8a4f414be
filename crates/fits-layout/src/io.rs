//! The random-access medium abstraction segments are read from and rewritten to.
//!
//! With the `std` feature this module re-exports the standard library's I/O
//! traits, so a `std::fs::File` or `std::io::Cursor<Vec<u8>>` is a medium as-is.
//! In `no_std` mode, minimal equivalents are provided that cover seek,
//! sequential read/write and flush, which is all a medium has to offer.

#[cfg(feature = "std")]
#[allow(unused_imports)]
pub use std::io::{Cursor, Error as IoError, Read, Result, Seek, SeekFrom, Write};

/// A random-access byte medium: seekable, readable, writable and flushable.
///
/// Blanket-implemented for every type with the three I/O traits.
pub trait Medium: Read + Write + Seek {}

impl<T: Read + Write + Seek + ?Sized> Medium for T {}

/// Current byte offset of `medium`, without moving it.
pub fn stream_position<S: Seek + ?Sized>(medium: &mut S) -> Result<u64> {
    medium.seek(SeekFrom::Current(0))
}

/// Total length of `medium` in bytes. The cursor is restored afterwards.
pub fn stream_len<S: Seek + ?Sized>(medium: &mut S) -> Result<u64> {
    let here = stream_position(medium)?;
    let len = medium.seek(SeekFrom::End(0))?;
    if here != len {
        medium.seek(SeekFrom::Start(here))?;
    }
    Ok(len)
}

/// Whether `err` reports that the medium ended before a read was satisfied.
#[cfg(feature = "std")]
pub fn is_unexpected_eof(err: &IoError) -> bool {
    err.kind() == std::io::ErrorKind::UnexpectedEof
}

/// Whether `err` reports that the medium ended before a read was satisfied.
#[cfg(not(feature = "std"))]
pub fn is_unexpected_eof(err: &IoError) -> bool {
    matches!(err, IoError::UnexpectedEof)
}

// ── no_std: provide our own implementations ──

#[cfg(not(feature = "std"))]
mod nostd {
    extern crate alloc;

    use alloc::vec::Vec;

    /// Minimal I/O error type for `no_std` environments.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum IoError {
        /// An operation attempted to read past the end of available data.
        UnexpectedEof,
        /// The medium accepted no more bytes.
        WriteZero,
        /// A seek landed on a negative absolute position.
        InvalidSeek,
    }

    impl core::fmt::Display for IoError {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            match self {
                IoError::UnexpectedEof => write!(f, "unexpected end of file"),
                IoError::WriteZero => write!(f, "write zero"),
                IoError::InvalidSeek => write!(f, "invalid seek to negative position"),
            }
        }
    }

    /// Convenience result type that uses [`IoError`].
    pub type Result<T> = core::result::Result<T, IoError>;

    /// Describes a position to seek to within a medium.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SeekFrom {
        /// Absolute byte offset from the start.
        Start(u64),
        /// Relative to the current position (may be negative).
        Current(i64),
        /// Relative to the end of the medium (may be negative).
        End(i64),
    }

    /// Read bytes from a medium.
    pub trait Read {
        /// Pull some bytes into `buf`, returning how many were read.
        fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

        /// Read exactly `buf.len()` bytes or fail with `UnexpectedEof`.
        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            let mut offset = 0;
            while offset < buf.len() {
                match self.read(&mut buf[offset..])? {
                    0 => return Err(IoError::UnexpectedEof),
                    n => offset += n,
                }
            }
            Ok(())
        }
    }

    /// Write bytes to a medium.
    pub trait Write {
        /// Write part of `buf`, returning how many bytes were accepted.
        fn write(&mut self, buf: &[u8]) -> Result<usize>;

        /// Flush any buffered output.
        fn flush(&mut self) -> Result<()>;

        /// Write all of `buf` or fail with `WriteZero`.
        fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            let mut offset = 0;
            while offset < buf.len() {
                match self.write(&buf[offset..])? {
                    0 => return Err(IoError::WriteZero),
                    n => offset += n,
                }
            }
            Ok(())
        }
    }

    /// Seek to a position within a medium.
    pub trait Seek {
        /// Seek to `pos`, returning the new absolute offset.
        fn seek(&mut self, pos: SeekFrom) -> Result<u64>;
    }

    /// An in-memory medium backed by a growable byte buffer.
    ///
    /// This is the `no_std` equivalent of `std::io::Cursor<Vec<u8>>`.
    #[derive(Debug, Clone)]
    pub struct Cursor<T> {
        inner: T,
        pos: u64,
    }

    impl<T> Cursor<T> {
        /// Create a new cursor at position zero.
        pub fn new(inner: T) -> Self {
            Cursor { inner, pos: 0 }
        }

        /// Return the current byte offset of the cursor.
        pub fn position(&self) -> u64 {
            self.pos
        }

        /// Set the cursor position.
        pub fn set_position(&mut self, pos: u64) {
            self.pos = pos;
        }

        /// Consume the cursor, returning the wrapped buffer.
        pub fn into_inner(self) -> T {
            self.inner
        }

        /// Borrow the wrapped buffer.
        pub fn get_ref(&self) -> &T {
            &self.inner
        }

        /// Mutably borrow the wrapped buffer.
        pub fn get_mut(&mut self) -> &mut T {
            &mut self.inner
        }
    }

    impl Read for Cursor<Vec<u8>> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let start = self.pos as usize;
            if start >= self.inner.len() {
                return Ok(0);
            }
            let available = &self.inner[start..];
            let n = buf.len().min(available.len());
            buf[..n].copy_from_slice(&available[..n]);
            self.pos += n as u64;
            Ok(n)
        }
    }

    impl Write for Cursor<Vec<u8>> {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            let start = self.pos as usize;
            // Extend if writing past the current end.
            if start + buf.len() > self.inner.len() {
                self.inner.resize(start + buf.len(), 0);
            }
            self.inner[start..start + buf.len()].copy_from_slice(buf);
            self.pos += buf.len() as u64;
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl Seek for Cursor<Vec<u8>> {
        fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
            let len = self.inner.len() as i64;
            let new_pos = match pos {
                SeekFrom::Start(offset) => offset as i64,
                SeekFrom::Current(offset) => self.pos as i64 + offset,
                SeekFrom::End(offset) => len + offset,
            };
            if new_pos < 0 {
                return Err(IoError::InvalidSeek);
            }
            self.pos = new_pos as u64;
            Ok(self.pos)
        }
    }
}

#[cfg(not(feature = "std"))]
pub use nostd::*;

// ── Tests ──
