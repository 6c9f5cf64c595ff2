//! Locating the package document through `META-INF/container.xml`.

use crate::error::{Error, Result};

/// Find the package document path named by a container descriptor.
///
/// Every `rootfile` element directly inside a `rootfiles` element and carrying a
/// `full-path` attribute is visited in document order, and the last one wins.
/// Namespaces are ignored. An empty `full-path` on that last element counts as
/// no manifest at all.
pub fn locate_manifest(container: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(container).map_err(|err| Error::Parse(err.to_string()))?;
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)
        .map_err(|err| Error::Parse(err.to_string()))?;

    let rootfile = doc
        .descendants()
        .filter(|node| node.has_tag_name("rootfile"))
        .filter(|node| {
            node.parent_element()
                .is_some_and(|parent| parent.has_tag_name("rootfiles"))
        })
        .filter_map(|node| node.attribute("full-path"))
        .last();

    match rootfile {
        Some(path) if !path.is_empty() => Ok(path.to_string()),
        _ => Err(Error::ManifestNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    #[test]
    fn finds_the_rootfile() {
        assert_eq!(locate_manifest(CONTAINER.as_bytes()).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn last_rootfile_wins() {
        let xml = r#"<container>
  <rootfiles>
    <rootfile full-path="first.opf"/>
    <rootfile media-type="application/oebps-package+xml"/>
    <rootfile full-path="second.opf"/>
  </rootfiles>
</container>"#;
        assert_eq!(locate_manifest(xml.as_bytes()).unwrap(), "second.opf");
    }

    #[test]
    fn rootfiles_anywhere_count() {
        let xml = r#"<wrapper><container><rootfiles><rootfile full-path="deep.opf"/></rootfiles></container></wrapper>"#;
        assert_eq!(locate_manifest(xml.as_bytes()).unwrap(), "deep.opf");
    }

    #[test]
    fn rootfile_outside_rootfiles_is_ignored() {
        let xml = r#"<container><rootfile full-path="stray.opf"/><rootfiles/></container>"#;
        assert!(matches!(locate_manifest(xml.as_bytes()), Err(Error::ManifestNotFound)));
    }

    #[test]
    fn empty_full_path_is_not_a_manifest() {
        let xml = r#"<container><rootfiles><rootfile full-path="a.opf"/><rootfile full-path=""/></rootfiles></container>"#;
        assert!(matches!(locate_manifest(xml.as_bytes()), Err(Error::ManifestNotFound)));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        assert!(matches!(
            locate_manifest(b"<container><rootfiles>"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(locate_manifest(&[0xFF, 0xFE, 0x00]), Err(Error::Parse(_))));
    }
}
