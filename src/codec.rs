//! Unpacking EPUB files into a [`VirtualArchive`] and packing them back.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::archive::VirtualArchive;
use crate::error::{Error, Result};
use crate::io::{LocalFileReader, MemoryReader, ReadAt};
use crate::zip::{CompressionMethod, ZipExtractor, ZipWriter};

/// Name of the entry identifying the archive type.
pub const MIMETYPE_PATH: &str = "mimetype";
/// Contents of the `mimetype` entry of every packed archive.
pub const EPUB_MIMETYPE: &[u8] = b"application/epub+zip";
/// Fixed location of the container descriptor.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Read every file of the archive at `src` into memory.
///
/// Nothing is returned unless every entry decodes.
pub async fn unpack(src: &Path) -> Result<VirtualArchive> {
    let reader = LocalFileReader::new(src).map_err(|source| match source.kind() {
        ErrorKind::NotFound => Error::NotFound(src.to_path_buf()),
        _ => Error::Io {
            path: src.to_path_buf(),
            source,
        },
    })?;
    unpack_from(Arc::new(reader)).await
}

/// Decode an archive that is already in memory.
pub async fn unpack_bytes(data: Vec<u8>) -> Result<VirtualArchive> {
    unpack_from(Arc::new(MemoryReader::new(data))).await
}

async fn unpack_from<R: ReadAt + 'static>(reader: Arc<R>) -> Result<VirtualArchive> {
    let extractor = ZipExtractor::new(reader);
    let archive = VirtualArchive::new();

    for entry in extractor.list_files().await? {
        if entry.is_directory {
            continue;
        }
        let data = extractor.extract_to_memory(&entry).await?;
        debug!(path = %entry.file_name, size = data.len(), "unpacked entry");
        archive.write(&entry.file_name, data);
    }

    Ok(archive)
}

/// Encode `archive` as an EPUB byte stream.
///
/// The first entry is always an uncompressed `mimetype` containing
/// `application/epub+zip`, whatever the archive holds under that name; every
/// other entry is deflated.
pub fn pack_bytes(archive: &VirtualArchive) -> Result<Vec<u8>> {
    if !archive.exists(CONTAINER_PATH) {
        return Err(Error::MissingContainer);
    }
    encode(archive).map_err(|err| Error::Write {
        path: "<memory>".into(),
        source: std::io::Error::other(err),
    })
}

fn encode(archive: &VirtualArchive) -> std::result::Result<Vec<u8>, crate::zip::ZipError> {
    let mut writer = ZipWriter::new(Vec::new());
    writer.write_entry(MIMETYPE_PATH, EPUB_MIMETYPE, CompressionMethod::Stored)?;

    for name in archive.list() {
        if name == MIMETYPE_PATH {
            continue;
        }
        // Removed since the listing was taken; nothing left to write
        let Some(contents) = archive.read(&name) else {
            continue;
        };
        writer.write_entry(&name, &contents, CompressionMethod::Deflate)?;
    }

    writer.finish()
}

/// Write `archive` to `dest` as an EPUB.
///
/// # Errors
///
/// - [`Error::MissingContainer`] if the archive has no `META-INF/container.xml`;
///   `dest` is left untouched.
/// - [`Error::AlreadyExists`] if `dest` exists and `overwrite` is false.
/// - [`Error::Write`] if the output cannot be encoded or written. A partially
///   written `dest` may remain.
pub async fn pack(dest: &Path, overwrite: bool, archive: &VirtualArchive) -> Result<()> {
    if !archive.exists(CONTAINER_PATH) {
        return Err(Error::MissingContainer);
    }

    let write_error = |source: std::io::Error| Error::Write {
        path: dest.to_path_buf(),
        source,
    };

    if fs::try_exists(dest).await.map_err(write_error)? {
        if !overwrite {
            return Err(Error::AlreadyExists(dest.to_path_buf()));
        }
        debug!(path = %dest.display(), "removing existing output");
        remove_existing(dest).await.map_err(write_error)?;
    }

    let bytes = encode(archive).map_err(|err| write_error(std::io::Error::other(err)))?;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => Error::AlreadyExists(dest.to_path_buf()),
            _ => write_error(source),
        })?;
    file.write_all(&bytes).await.map_err(write_error)?;
    file.flush().await.map_err(write_error)?;

    debug!(path = %dest.display(), size = bytes.len(), "packed archive");
    Ok(())
}

async fn remove_existing(path: &Path) -> std::io::Result<()> {
    if fs::metadata(path).await?.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}
