//! Seams for the markup and package-document rewriting rules.

use crate::error::TransformError;

/// Rewrites the markup of one content document.
///
/// Called concurrently from several workers, once per document, so
/// implementations must not depend on state carried between calls.
pub trait ContentTransform: Send + Sync {
    fn transform(&self, content: &str) -> Result<String, TransformError>;
}

impl<F> ContentTransform for F
where
    F: Fn(&str) -> Result<String, TransformError> + Send + Sync,
{
    fn transform(&self, content: &str) -> Result<String, TransformError> {
        self(content)
    }
}

/// Rewrites the package document in place. Called once per conversion.
pub trait ManifestTransform: Send + Sync {
    fn transform(&self, document: &mut String) -> Result<(), TransformError>;
}

impl<F> ManifestTransform for F
where
    F: Fn(&mut String) -> Result<(), TransformError> + Send + Sync,
{
    fn transform(&self, document: &mut String) -> Result<(), TransformError> {
        self(document)
    }
}

/// Leaves documents as they are, making a conversion a clean repack.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ContentTransform for Identity {
    fn transform(&self, content: &str) -> Result<String, TransformError> {
        Ok(content.to_string())
    }
}

impl ManifestTransform for Identity {
    fn transform(&self, _document: &mut String) -> Result<(), TransformError> {
        Ok(())
    }
}
