use std::io;
use thiserror::Error;

/// Errors raised while decoding or encoding a zip archive.
#[derive(Debug, Error)]
pub enum ZipError {
    #[error("not a valid zip archive")]
    NotZip,

    #[error("invalid {0}")]
    InvalidRecord(&'static str),

    #[error("archive is truncated: {0}")]
    Truncated(#[source] io::Error),

    #[error("{name}: unsupported compression method {method}")]
    UnsupportedCompression { name: String, method: u16 },

    #[error("{0}: encrypted entries are not supported")]
    Encrypted(String),

    #[error("{name}: corrupt compressed data: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("{name}: CRC-32 mismatch (expected {expected:08x}, got {actual:08x})")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("archive too large to write without ZIP64")]
    TooLarge,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for ZipError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::Truncated(err),
            _ => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZipError>;
