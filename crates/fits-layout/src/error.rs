use crate::io::IoError;

/// All errors that can occur while laying out or rewriting FITS records.
#[derive(Debug)]
pub enum Error {
    /// Malformed FITS header block.
    InvalidHeader(&'static str),
    /// Premature end of data while reading.
    UnexpectedEof,
    /// Malformed keyword name in a header card.
    InvalidKeyword,
    /// A header value could not be parsed or encoded.
    InvalidValue,
    /// A required keyword was not found in the header.
    MissingKeyword(&'static str),
    /// An in-place rewrite was refused: the segment is unbound, or its
    /// current payload no longer fills the same number of blocks.
    IllegalRewrite,
    /// The medium failed while an in-place rewrite was under way.
    RewriteIo(IoError),
    /// Any other I/O error from the underlying medium.
    Io(IoError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHeader(why) => write!(f, "invalid FITS header: {why}"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::InvalidValue => write!(f, "invalid header value"),
            Error::MissingKeyword(kw) => write!(f, "missing required keyword: {kw}"),
            Error::IllegalRewrite => write!(f, "illegal attempt to rewrite data"),
            Error::RewriteIo(e) => write!(f, "I/O error during rewrite: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) | Error::RewriteIo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl Error {
    /// Reclassify a medium failure as having happened during a rewrite.
    /// Non-I/O errors pass through unchanged.
    pub(crate) fn during_rewrite(self) -> Self {
        match self {
            Error::Io(e) => Error::RewriteIo(e),
            other => other,
        }
    }
}
