//! # kepubify
//!
//! Converts EPUB books into kepubs, the EPUB flavour Kobo e-readers render
//! with their enhanced reading features.
//!
//! A conversion unpacks the whole book into an in-memory [`VirtualArchive`],
//! rewrites every HTML/XHTML document concurrently through a
//! [`ContentTransform`], rewrites the package document through a
//! [`ManifestTransform`], drops files other tools leave behind and packs the
//! result with the uncompressed `mimetype` entry first, as EPUB readers expect.
//!
//! ## Example
//!
//! ```no_run
//! use kepubify::{ConvertOptions, Converter, LogProgress};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> kepubify::Result<()> {
//!     let converter = Converter::new(ConvertOptions {
//!         overwrite: true,
//!         ..ConvertOptions::default()
//!     })
//!     .with_progress(LogProgress);
//!
//!     converter
//!         .convert(Path::new("book.epub"), Path::new("book.kepub.epub"))
//!         .await
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod codec;
pub mod container;
pub mod convert;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod progress;
pub mod sanitize;
pub mod transform;
pub mod zip;

pub use archive::VirtualArchive;
pub use cli::Cli;
pub use codec::{pack, pack_bytes, unpack, unpack_bytes};
pub use container::locate_manifest;
pub use convert::{ConvertOptions, Converter, Stage};
pub use error::{Error, Result, TransformError};
pub use pipeline::transform_content;
pub use progress::{LogProgress, Progress};
pub use sanitize::sanitize;
pub use transform::{ContentTransform, Identity, ManifestTransform};
