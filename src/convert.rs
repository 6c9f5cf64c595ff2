//! Conversion of one EPUB file into a kepub.
//!
//! A conversion is a straight line of stages:
//!
//! 1. [`Stage::Unpack`]: read the source into a [`VirtualArchive`]
//! 2. [`Stage::Content`]: run the content transform over every HTML/XHTML document
//! 3. [`Stage::LocateManifest`]: find the package document through `META-INF/container.xml`
//! 4. [`Stage::Manifest`]: run the manifest transform over the package document
//! 5. [`Stage::Sanitize`]: drop junk left by other tools
//! 6. [`Stage::Pack`]: write the destination
//!
//! The first failing stage ends the conversion. Only the last stage touches the
//! destination, so a failure never leaves an output behind unless packing itself
//! failed part way.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::archive::VirtualArchive;
use crate::codec::{self, CONTAINER_PATH};
use crate::container::locate_manifest;
use crate::error::{Error, Result, TransformError};
use crate::pipeline;
use crate::progress::Progress;
use crate::sanitize::sanitize;
use crate::transform::{ContentTransform, Identity, ManifestTransform};

/// A step of a conversion, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Unpack,
    Content,
    LocateManifest,
    Manifest,
    Sanitize,
    Pack,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Unpack => "reading epub",
            Stage::Content => "processing content files",
            Stage::LocateManifest => "locating package document",
            Stage::Manifest => "processing package document",
            Stage::Sanitize => "cleaning epub files",
            Stage::Pack => "packing epub",
        })
    }
}

/// Settings for a [`Converter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Replace an existing destination instead of failing with [`Error::AlreadyExists`].
    pub overwrite: bool,
    /// Upper bound on content documents transformed at the same time.
    pub parallelism: NonZeroUsize,
}

impl ConvertOptions {
    /// One more than the number of available processors.
    pub fn default_parallelism() -> NonZeroUsize {
        std::thread::available_parallelism()
            .map(|n| n.saturating_add(1))
            .unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            parallelism: Self::default_parallelism(),
        }
    }
}

/// Runs conversions with a fixed set of transforms.
///
/// ```no_run
/// use kepubify::{ConvertOptions, Converter, TransformError};
/// use std::path::Path;
///
/// # async fn run() -> kepubify::Result<()> {
/// let converter = Converter::new(ConvertOptions::default())
///     .with_content_transform(|html: &str| -> Result<String, TransformError> {
///         Ok(html.replace("<body>", "<body><div id=\"book-inner\">"))
///     });
/// converter
///     .convert(Path::new("book.epub"), Path::new("book.kepub.epub"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Converter {
    options: ConvertOptions,
    content: Arc<dyn ContentTransform>,
    manifest: Arc<dyn ManifestTransform>,
    progress: Option<Arc<dyn Progress>>,
}

impl Converter {
    /// A converter that repacks without changing any document.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            content: Arc::new(Identity),
            manifest: Arc::new(Identity),
            progress: None,
        }
    }

    pub fn with_content_transform(mut self, transform: impl ContentTransform + 'static) -> Self {
        self.content = Arc::new(transform);
        self
    }

    pub fn with_manifest_transform(mut self, transform: impl ManifestTransform + 'static) -> Self {
        self.manifest = Arc::new(transform);
        self
    }

    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    fn enter(&self, stage: Stage) {
        debug!(%stage, "entering stage");
        if let Some(progress) = &self.progress {
            progress.stage(stage);
        }
    }

    /// Convert the EPUB at `src` and write the result to `dest`.
    pub async fn convert(&self, src: &Path, dest: &Path) -> Result<()> {
        info!(src = %src.display(), dest = %dest.display(), "converting");

        self.enter(Stage::Unpack);
        let archive = Arc::new(codec::unpack(src).await?);
        debug!(files = archive.len(), "unpacked");

        self.process(Arc::clone(&archive)).await?;

        self.enter(Stage::Pack);
        codec::pack(dest, self.options.overwrite, &archive).await?;

        info!(dest = %dest.display(), "converted");
        Ok(())
    }

    /// Run the in-memory stages (content, manifest, sanitize) over an unpacked archive.
    pub async fn process(&self, archive: Arc<VirtualArchive>) -> Result<()> {
        self.enter(Stage::Content);
        let processed = pipeline::transform_content(
            Arc::clone(&archive),
            Arc::clone(&self.content),
            self.options.parallelism,
            self.progress.clone(),
        )
        .await?;
        debug!(processed, "content files processed");

        self.enter(Stage::LocateManifest);
        let container = archive.read(CONTAINER_PATH).ok_or(Error::MissingContainer)?;
        let manifest_path = locate_manifest(&container)?;
        let manifest = archive
            .read(&manifest_path)
            .ok_or_else(|| Error::ManifestMissing(manifest_path.clone()))?;
        debug!(path = %manifest_path, "located package document");

        self.enter(Stage::Manifest);
        let manifest_error = |source: TransformError| Error::ManifestTransform {
            path: manifest_path.clone(),
            source,
        };
        let mut document =
            String::from_utf8(manifest).map_err(|err| manifest_error(Box::new(err)))?;
        self.manifest
            .transform(&mut document)
            .map_err(manifest_error)?;
        archive.write(&manifest_path, document);

        self.enter(Stage::Sanitize);
        let removed = sanitize(&archive);
        debug!(removed, "removed junk files");

        Ok(())
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
