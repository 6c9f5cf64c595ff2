//! Error types for conversions

use std::path::PathBuf;
use thiserror::Error;

use crate::convert::Stage;
use crate::zip::ZipError;

/// Conversion result type
pub type Result<T> = std::result::Result<T, Error>;

/// The cause reported by a content or manifest transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Conversion error type
///
/// A conversion reports at most one of these: every stage fails fast.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("could not read epub: {0}")]
    Decode(#[from] ZipError),

    #[error("could not find META-INF/container.xml")]
    MissingContainer,

    #[error("error parsing container.xml: {0}")]
    Parse(String),

    #[error("error parsing container.xml: no rootfile with a full-path")]
    ManifestNotFound,

    #[error("error opening package document {0:?}: does not exist")]
    ManifestMissing(String),

    #[error("could not open content file {0:?} for reading: does not exist")]
    ReadMissing(String),

    #[error("error processing content file {path:?}: {source}")]
    ContentTransform {
        path: String,
        #[source]
        source: TransformError,
    },

    #[error("error processing package document {path:?}: {source}")]
    ManifestTransform {
        path: String,
        #[source]
        source: TransformError,
    },

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("error writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The conversion stage this error ends.
    ///
    /// A conversion reads `META-INF/container.xml` while locating the package
    /// document, so [`Error::MissingContainer`] belongs to that stage even though
    /// packing checks for it too.
    pub fn stage(&self) -> Stage {
        match self {
            Error::NotFound(_) | Error::Decode(_) | Error::Io { .. } => Stage::Unpack,
            Error::ReadMissing(_) | Error::ContentTransform { .. } => Stage::Content,
            Error::MissingContainer
            | Error::Parse(_)
            | Error::ManifestNotFound
            | Error::ManifestMissing(_) => Stage::LocateManifest,
            Error::ManifestTransform { .. } => Stage::Manifest,
            Error::AlreadyExists(_) | Error::Write { .. } => Stage::Pack,
        }
    }

    /// The archive entry involved, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::ManifestMissing(path)
            | Error::ReadMissing(path)
            | Error::ContentTransform { path, .. }
            | Error::ManifestTransform { path, .. } => Some(path),
            _ => None,
        }
    }
}
