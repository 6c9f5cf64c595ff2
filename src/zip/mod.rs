//! ZIP archive reading and writing.
//!
//! ## Architecture
//!
//! - [`structures`]: records of the ZIP format (EOCD, headers, flags)
//! - [`parser`]: locating and parsing those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: decompressing entry data into memory
//! - [`writer`]: laying out a new archive entry by entry
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - STORED and DEFLATE entries, with CRC-32 verification on read
//! - ZIP64 end of central directory records on read
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - Writing is limited to archives that fit without ZIP64 records

mod error;
mod extractor;
#[cfg(test)]
mod fixtures;
mod parser;
mod structures;
mod writer;

pub use error::ZipError;
pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::ZipWriter;
