#![forbid(unsafe_code)]

//! Element lookup over a parsed `roxmltree` document.
//!
//! roxmltree resolves namespaces but does not keep the prefix an element or
//! attribute was written with. Canonical output must reproduce that prefix,
//! so [`qualified_name`] and [`attribute_qualified_name`] read it back from
//! the source text through the node's byte range.

use avskild_core::ns;

/// Find the first descendant element with the given local name and namespace.
pub fn find_element<'a, 'i>(
    doc: &'a roxmltree::Document<'i>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'i>> {
    doc.descendants()
        .find(|n| is_element_named(n, &[ns_uri], local_name))
}

/// Find the first element below `root` (not `root` itself) whose qualified
/// name, as written in the source, equals `qname`.
///
/// Namespace bindings play no part in the match: `Signature` finds
/// `<Signature>` in any default namespace but never `<ds:Signature>`.
pub fn find_descendant_by_qname<'a, 'i>(
    root: roxmltree::Node<'a, 'i>,
    qname: &str,
) -> Option<roxmltree::Node<'a, 'i>> {
    root.descendants()
        .skip(1)
        .find(|n| n.is_element() && qualified_name(*n) == qname)
}

/// Find the first child element with the given local name in one of `namespaces`.
///
/// An empty string in `namespaces` matches elements in no namespace.
pub fn find_child_element<'a, 'i>(
    parent: roxmltree::Node<'a, 'i>,
    namespaces: &[&str],
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'i>> {
    parent
        .children()
        .find(|n| is_element_named(n, namespaces, local_name))
}

/// Find all child elements with the given local name in one of `namespaces`.
pub fn find_child_elements<'a, 'i>(
    parent: roxmltree::Node<'a, 'i>,
    namespaces: &[&str],
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'i>> {
    parent
        .children()
        .filter(|n| is_element_named(n, namespaces, local_name))
        .collect()
}

fn is_element_named(node: &roxmltree::Node<'_, '_>, namespaces: &[&str], local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && namespaces.contains(&node.tag_name().namespace().unwrap_or(""))
}

/// Concatenated text of all descendant text nodes.
///
/// `Node::text` only returns the first text child, which breaks on values
/// split by comments or CDATA sections.
pub fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Text content with every whitespace character removed, as needed before
/// base64 decoding a `DigestValue`, `SignatureValue` or certificate.
pub fn compact_text(node: roxmltree::Node<'_, '_>) -> String {
    text_content(node)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// The element's qualified name (`prefix:local` or `local`) as written.
pub fn qualified_name(node: roxmltree::Node<'_, '_>) -> String {
    let local = node.tag_name().name();
    let input = node.document().input_text();
    let range = node.range();
    if let Some(tail) = input.get(range.start..range.end) {
        if let Some(after_lt) = tail.strip_prefix('<') {
            let end = after_lt
                .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
                .unwrap_or(after_lt.len());
            let written = &after_lt[..end];
            if qname_matches(written, local) {
                return written.to_owned();
            }
        }
    }
    // Entity-expanded markup has no usable source range.
    match node.tag_name().namespace() {
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
            _ => local.to_owned(),
        },
        None => local.to_owned(),
    }
}

/// The prefix of the element as written, if any.
pub fn element_prefix(node: roxmltree::Node<'_, '_>) -> Option<String> {
    qualified_name(node)
        .split_once(':')
        .map(|(prefix, _)| prefix.to_owned())
}

/// The attribute's qualified name as written.
pub fn attribute_qualified_name(
    node: roxmltree::Node<'_, '_>,
    attr: &roxmltree::Attribute<'_, '_>,
) -> String {
    let local = attr.name();
    let Some(uri) = attr.namespace() else {
        return local.to_owned();
    };
    if uri == ns::XML {
        return format!("xml:{local}");
    }
    let input = node.document().input_text();
    if let Some(written) = input.get(attr.range_qname()) {
        if qname_matches(written, local) && written.contains(':') {
            return written.to_owned();
        }
    }
    match node.lookup_prefix(uri) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_owned(),
    }
}

fn qname_matches(written: &str, local: &str) -> bool {
    match written.split_once(':') {
        Some((_, written_local)) => written_local == local,
        None => written == local,
    }
}
