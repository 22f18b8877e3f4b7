#![forbid(unsafe_code)]

//! XML plumbing for avskild.
//!
//! Parsing goes through `roxmltree`; this crate adds the lookups a signature
//! document needs, recovery of qualified names from the source text, a
//! subtree `NodeSet` for document-subset canonicalization, and an
//! `XmlWriter` that emits elements already in canonical form.

pub mod document;
pub mod escape;
pub mod nodeset;
pub mod writer;

pub use nodeset::NodeSet;
pub use writer::XmlWriter;

use avskild_core::Error;

/// Return roxmltree parsing options that allow DTD.
///
/// roxmltree never fetches external entities and only substitutes internal
/// ones, so a DOCTYPE in a signature document is harmless.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parse UTF-8 text into a namespace-aware document.
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse_with_options(text, parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// Check that `data` is UTF-8 and return it as text.
pub fn as_utf8(data: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(data).map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allows_internal_dtd() {
        let xml = r#"<!DOCTYPE r [<!ENTITY who "world">]><r>hello &who;</r>"#;
        let doc = parse(xml).unwrap();
        assert_eq!(doc.root_element().text(), Some("hello world"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse("<a><b></a>"), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_as_utf8_rejects_invalid_bytes() {
        assert!(as_utf8(&[0x3c, 0xff, 0x3e]).is_err());
        assert_eq!(as_utf8(b"<a/>").unwrap(), "<a/>");
    }
}
