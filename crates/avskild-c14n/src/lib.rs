#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for avskild.
//!
//! Implements Canonical XML 1.0, the inclusive variant, with and without
//! comments. Signatures produced by avskild always use the variant without
//! comments; verification also accepts the `#WithComments` form.

pub mod inclusive;
pub mod render;

pub use avskild_xml::escape;

use avskild_core::{algorithm, Error};
use avskild_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments)
    }
}

/// Canonicalize an XML document given as text.
///
/// - `xml`: the raw XML text
/// - `mode`: which C14N variant to use
/// - `node_set`: optional node set (for document-subset canonicalization)
pub fn canonicalize(
    xml: &str,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let doc = avskild_xml::parse(xml)?;
    canonicalize_doc(&doc, mode, node_set)
}

/// Canonicalize a pre-parsed document.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    inclusive::canonicalize(doc, mode.with_comments(), node_set)
}

/// Canonicalize the subtree rooted at `element` as a document subset.
///
/// Namespace declarations in scope from ancestors are rendered on the
/// subtree's top element, as the subset rules require. This is how
/// `SignedInfo` is turned into the octets that get signed.
pub fn canonicalize_subtree(
    element: roxmltree::Node<'_, '_>,
    mode: C14nMode,
) -> Result<Vec<u8>, Error> {
    if !element.is_element() {
        return Err(Error::Canonicalization(
            "subtree canonicalization needs an element".into(),
        ));
    }
    let node_set = if mode.with_comments() {
        NodeSet::tree_with_comments(element)
    } else {
        NodeSet::tree_without_comments(element)
    };
    canonicalize_doc(element.document(), mode, Some(&node_set))
}
