#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! The canonical form:
//! - Outputs namespace declarations sorted by prefix (default first)
//! - Outputs attributes sorted by (namespace-URI, local-name)
//! - Escapes text and attribute values
//! - Optionally preserves or strips comments
//! - Supports document-subset canonicalization via NodeSet

use crate::escape;
use crate::render::{Attr, NsDecl};
use avskild_core::{ns, Error};
use avskild_xml::document::{attribute_qualified_name, qualified_name};
use avskild_xml::NodeSet;
use std::collections::BTreeMap;

/// Prefix → URI bindings rendered by the nearest output ancestor.
type NsScope = BTreeMap<String, String>;

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        with_comments,
        node_set,
    };
    ctx.process_node(doc.root(), &mut output, &NsScope::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
}

impl C14nContext<'_> {
    fn is_visible(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |set| set.contains(node))
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &NsScope,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, inherited_ns)?;
                }
            }
            roxmltree::NodeType::Element => {
                self.process_element(node, output, inherited_ns)?;
            }
            roxmltree::NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    output.extend_from_slice(escape::escape_text(text).as_bytes());
                }
            }
            roxmltree::NodeType::Comment => {
                if self.with_comments && self.is_visible(&node) {
                    self.around_top_level(node, output, |out| {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(node.text().unwrap_or("").as_bytes());
                        out.extend_from_slice(b"-->");
                    });
                }
            }
            roxmltree::NodeType::PI => {
                if self.is_visible(&node) {
                    self.around_top_level(node, output, |out| {
                        out.extend_from_slice(b"<?");
                        if let Some(pi) = node.pi() {
                            out.extend_from_slice(pi.target.as_bytes());
                            if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                                out.push(b' ');
                                out.extend_from_slice(escape::escape_pi(value).as_bytes());
                            }
                        }
                        out.extend_from_slice(b"?>");
                    });
                }
            }
        }
        Ok(())
    }

    /// Comments and PIs outside the document element are separated from it
    /// by a single line feed on the side facing the element.
    fn around_top_level(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        write: impl FnOnce(&mut Vec<u8>),
    ) {
        let top_level = node
            .parent()
            .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);
        if top_level && node.prev_siblings().any(|s| s.is_element()) {
            output.push(b'\n');
        }
        write(output);
        if top_level && node.next_siblings().any(|s| s.is_element()) {
            output.push(b'\n');
        }
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        inherited_ns: &NsScope,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            // An element outside the subset contributes nothing itself; its
            // visible descendants compare against the same output ancestor.
            for child in node.children() {
                self.process_node(child, output, inherited_ns)?;
            }
            return Ok(());
        }

        let in_scope = collect_inscope_namespaces(&node);

        let mut ns_decls: Vec<NsDecl> = in_scope
            .iter()
            .filter(|(prefix, uri)| inherited_ns.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl::new(prefix.as_str(), uri.as_str()))
            .collect();
        // The output ancestor put a default namespace in force that no
        // longer applies here.
        let default_dropped = !in_scope.contains_key("")
            && inherited_ns.get("").is_some_and(|uri| !uri.is_empty());
        if default_dropped {
            ns_decls.push(NsDecl::new("", ""));
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|attr| Attr {
                ns_uri: attr.namespace().unwrap_or("").to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: attribute_qualified_name(node, &attr),
                value: attr.value().to_owned(),
            })
            .collect();

        // xml:* attributes are inherited only when the parent element is
        // outside the subset; otherwise the parent renders them itself.
        if self.node_set.is_some() {
            let parent_hidden = node
                .parent()
                .map_or(true, |p| !p.is_element() || !self.is_visible(&p));
            if parent_hidden {
                let extra = collect_inherited_xml_attrs(&node, &attrs);
                attrs.extend(extra);
            }
        }
        attrs.sort();

        let elem_name = qualified_name(node);

        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for decl in &ns_decls {
            decl.render_into(output);
        }
        for attr in &attrs {
            attr.render_into(output);
        }
        output.push(b'>');

        for child in node.children() {
            self.process_node(child, output, &in_scope)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// Collect xml:* attributes from all ancestors, nearest first, skipping
/// those the element already carries.
fn collect_inherited_xml_attrs(node: &roxmltree::Node<'_, '_>, existing: &[Attr]) -> Vec<Attr> {
    let mut inherited: BTreeMap<String, String> = BTreeMap::new();
    for ancestor in node.ancestors().skip(1).filter(|n| n.is_element()) {
        for attr in ancestor.attributes() {
            if attr.namespace() == Some(ns::XML) {
                inherited
                    .entry(attr.name().to_owned())
                    .or_insert_with(|| attr.value().to_owned());
            }
        }
    }

    inherited
        .into_iter()
        .filter(|(name, _)| {
            !existing
                .iter()
                .any(|a| a.ns_uri == ns::XML && a.local_name == *name)
        })
        .map(|(name, value)| Attr {
            ns_uri: ns::XML.to_owned(),
            qualified_name: format!("xml:{name}"),
            local_name: name,
            value,
        })
        .collect()
}

/// All namespace bindings in scope at an element.
///
/// roxmltree already merges ancestor declarations into each element's
/// namespace list. An empty default namespace means "no default" and is
/// left out; the `xml` prefix is never rendered.
fn collect_inscope_namespaces(node: &roxmltree::Node<'_, '_>) -> NsScope {
    node.namespaces()
        .filter_map(|decl| {
            let prefix = decl.name().unwrap_or("");
            let uri = decl.uri();
            if prefix == "xml" || (prefix.is_empty() && uri.is_empty()) {
                None
            } else {
                Some((prefix.to_owned(), uri.to_owned()))
            }
        })
        .collect()
}
