#![forbid(unsafe_code)]

//! Detached signature verification.
//!
//! Processing order:
//! 1. Parse the signature document and locate `<Signature>`
//! 2. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod, the single `<Reference>`
//! 3. Obtain the public key from the key provider
//! 4. Digest the detached content and compare with `<DigestValue>`
//! 5. Canonicalize `<SignedInfo>` and verify `<SignatureValue>`
//!
//! The embedded `<KeyInfo>` takes no part in any of this.

use crate::digester::digest_reference;
use crate::resolver::CallScopedResolver;
use avskild_c14n::C14nMode;
use avskild_core::{ns, Error};
use avskild_crypto::sign;
use avskild_keys::KeyProvider;
use avskild_xml::document::{compact_text, find_child_element, find_child_elements};

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Both the reference digest and the signature value match.
    Valid,
    /// One of the checks definitively failed.
    Invalid {
        reason: String,
    },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Child namespaces of a `Signature` found in the DSig namespace.
const DSIG_CHILDREN: &[&str] = &[ns::DSIG];
/// Child namespaces of a `Signature` found by plain tag name.
const LEGACY_CHILDREN: &[&str] = &[ns::DSIG, ""];

/// The parts of a detached signature document the verifier works with.
#[derive(Debug)]
pub(crate) struct ParsedSignature<'a, 'i> {
    pub signed_info: roxmltree::Node<'a, 'i>,
    pub key_info: Option<roxmltree::Node<'a, 'i>>,
    /// Namespaces the DSig children of this signature may use.
    pub namespaces: &'static [&'static str],
    /// `false` when `<Signature>` was found by the plain tag name fallback.
    pub namespace_qualified: bool,
    pub c14n_method: &'a str,
    pub signature_method: &'a str,
    pub reference_uri: &'a str,
    pub digest_method: &'a str,
    pub digest_value: String,
    pub signature_value: String,
}

/// Find `<Signature>`: by namespace first, then by plain tag name among the
/// root element's descendants.
pub(crate) fn locate_signature<'a, 'i>(
    doc: &'a roxmltree::Document<'i>,
) -> Result<(roxmltree::Node<'a, 'i>, bool), Error> {
    if let Some(node) = avskild_xml::document::find_element(doc, ns::DSIG, ns::node::SIGNATURE) {
        return Ok((node, true));
    }
    if let Some(node) =
        avskild_xml::document::find_descendant_by_qname(doc.root_element(), ns::node::SIGNATURE)
    {
        tracing::warn!(
            namespace = node.tag_name().namespace().unwrap_or(""),
            "Signature element found without the XML-DSig namespace"
        );
        return Ok((node, false));
    }
    Err(Error::MissingElement(ns::node::SIGNATURE.into()))
}

pub(crate) fn read_signature<'a, 'i>(
    doc: &'a roxmltree::Document<'i>,
) -> Result<ParsedSignature<'a, 'i>, Error> {
    use ns::{attr, node};

    let (sig_node, namespace_qualified) = locate_signature(doc)?;
    let namespaces = if namespace_qualified {
        DSIG_CHILDREN
    } else {
        LEGACY_CHILDREN
    };

    let signed_info = find_child_element(sig_node, namespaces, node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

    let c14n_method = find_child_element(signed_info, namespaces, node::CANONICALIZATION_METHOD)
        .ok_or_else(|| Error::MissingElement("CanonicalizationMethod".into()))?
        .attribute(attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on CanonicalizationMethod".into()))?;

    let signature_method = find_child_element(signed_info, namespaces, node::SIGNATURE_METHOD)
        .ok_or_else(|| Error::MissingElement("SignatureMethod".into()))?
        .attribute(attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on SignatureMethod".into()))?;

    let references = find_child_elements(signed_info, namespaces, node::REFERENCE);
    let reference = match references.as_slice() {
        [reference] => *reference,
        [] => return Err(Error::MissingElement("Reference".into())),
        more => {
            return Err(Error::XmlStructure(format!(
                "expected exactly one Reference, found {}",
                more.len()
            )))
        }
    };
    if find_child_element(reference, namespaces, node::TRANSFORMS).is_some() {
        return Err(Error::XmlStructure(
            "Transforms are not supported on a detached Reference".into(),
        ));
    }
    let reference_uri = reference
        .attribute(attr::URI)
        .ok_or_else(|| Error::MissingAttribute("URI on Reference".into()))?;
    let digest_method = find_child_element(reference, namespaces, node::DIGEST_METHOD)
        .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?
        .attribute(attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on DigestMethod".into()))?;
    let digest_value = find_child_element(reference, namespaces, node::DIGEST_VALUE)
        .map(compact_text)
        .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;

    let signature_value = find_child_element(sig_node, namespaces, node::SIGNATURE_VALUE)
        .map(compact_text)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;

    Ok(ParsedSignature {
        signed_info,
        key_info: find_child_element(sig_node, namespaces, node::KEY_INFO),
        namespaces,
        namespace_qualified,
        c14n_method,
        signature_method,
        reference_uri,
        digest_method,
        digest_value,
        signature_value,
    })
}

/// Verify `signature_document` against the detached `original` content,
/// using the public key of `provider`'s certificate.
pub fn verify(
    original: &[u8],
    signature_document: &[u8],
    provider: &dyn KeyProvider,
) -> Result<VerifyResult, Error> {
    let xml = avskild_xml::as_utf8(signature_document)?;
    let doc = avskild_xml::parse(xml)?;
    let parsed = read_signature(&doc)?;

    let c14n_mode = C14nMode::from_uri(parsed.c14n_method)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {}", parsed.c14n_method)))?;
    let signature_algorithm = sign::from_uri(parsed.signature_method)?;

    use base64::Engine;
    let engine = base64::engine::general_purpose::STANDARD;
    let expected_digest = engine
        .decode(&parsed.digest_value)
        .map_err(|e| Error::Base64(format!("DigestValue: {e}")))?;
    let signature_value = engine
        .decode(&parsed.signature_value)
        .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

    let store = provider.load()?;
    let certificate = provider.certificate(&store)?;
    let verifying_key = certificate.public_key().to_verifying_key();
    tracing::debug!(
        uri = parsed.reference_uri,
        digest_method = parsed.digest_method,
        signature_method = parsed.signature_method,
        key = ?verifying_key,
        "verifying detached signature"
    );

    let resolver = CallScopedResolver::new(original);
    let computed = digest_reference(parsed.reference_uri, parsed.digest_method, &resolver)?;
    if computed != expected_digest {
        return Ok(VerifyResult::Invalid {
            reason: format!(
                "URI={}: expected digest does not match computed digest",
                parsed.reference_uri
            ),
        });
    }

    let canonical_signed_info = avskild_c14n::canonicalize_subtree(parsed.signed_info, c14n_mode)?;
    tracing::debug!(
        signed_info = %String::from_utf8_lossy(&canonical_signed_info),
        "pre-signature SignedInfo"
    );

    if signature_algorithm.verify(&verifying_key, &canonical_signed_info, &signature_value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value verification failed".into(),
        })
    }
}
