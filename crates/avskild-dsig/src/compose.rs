#![forbid(unsafe_code)]

//! Signature composition.
//!
//! The signature document is written directly in canonical form:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Signature xmlns="http://www.w3.org/2000/09/xmldsig#">
//!   <SignedInfo>...one Reference over the detached content...</SignedInfo>
//!   <SignatureValue>...</SignatureValue>
//!   <KeyInfo><X509Data>...</X509Data><KeyValue>...</KeyValue></KeyInfo>
//! </Signature>
//! ```
//!
//! (shown indented here; the output has no whitespace between elements).
//! `SignedInfo` is first written inside a bare `Signature`, parsed back and
//! canonicalized as a document subset, so the octets that get signed are
//! exactly the ones a verifier will reproduce.

use crate::digester::digest_reference;
use crate::document::Document;
use crate::resolver::CallScopedResolver;
use avskild_c14n::C14nMode;
use avskild_core::{algorithm, ns, Error};
use avskild_crypto::sign;
use avskild_keys::{keyinfo, KeyProvider};
use avskild_xml::XmlWriter;
use base64::Engine;

/// Produce a detached signature over `document`.
pub fn compose(
    document: &Document,
    digest_method: &str,
    signature_method: &str,
    provider: &dyn KeyProvider,
) -> Result<Vec<u8>, Error> {
    let signature_algorithm = sign::from_uri(signature_method)?;

    let store = provider.load()?;
    let private_key = provider.private_key(&store)?;
    let certificate = provider.certificate(&store)?;
    tracing::debug!(
        key = ?private_key.data,
        subject = certificate.subject_name(),
        digest_method,
        signature_method,
        "composing detached signature"
    );

    let resolver = CallScopedResolver::new(document.data());
    let digest = digest_reference(document.file_name(), digest_method, &resolver)?;
    let engine = base64::engine::general_purpose::STANDARD;
    let reference = ReferenceParts {
        uri: document.file_name(),
        digest_method,
        digest_value: engine.encode(digest),
    };

    let canonical_signed_info = canonical_signed_info(&reference, signature_method)?;
    tracing::debug!(
        signed_info = %String::from_utf8_lossy(&canonical_signed_info),
        "pre-signature SignedInfo"
    );
    let signature_value =
        signature_algorithm.sign(&private_key.to_signing_key(), &canonical_signed_info)?;

    let mut w = XmlWriter::new();
    w.write_declaration()?;
    w.start_element(ns::node::SIGNATURE, &[("xmlns", ns::DSIG)])?;
    write_signed_info(&mut w, &reference, signature_method)?;
    w.text_element(
        ns::node::SIGNATURE_VALUE,
        &[],
        &engine.encode(signature_value),
    )?;
    keyinfo::write_key_info(&mut w, &certificate)?;
    w.end_element(ns::node::SIGNATURE)?;
    w.into_bytes()
}

struct ReferenceParts<'a> {
    uri: &'a str,
    digest_method: &'a str,
    digest_value: String,
}

fn write_signed_info(
    w: &mut XmlWriter,
    reference: &ReferenceParts<'_>,
    signature_method: &str,
) -> Result<(), Error> {
    use ns::{attr, node};

    w.start_element(node::SIGNED_INFO, &[])?;
    w.empty_element(
        node::CANONICALIZATION_METHOD,
        &[(attr::ALGORITHM, algorithm::C14N)],
    )?;
    w.empty_element(node::SIGNATURE_METHOD, &[(attr::ALGORITHM, signature_method)])?;
    w.start_element(node::REFERENCE, &[(attr::URI, reference.uri)])?;
    w.empty_element(
        node::DIGEST_METHOD,
        &[(attr::ALGORITHM, reference.digest_method)],
    )?;
    w.text_element(node::DIGEST_VALUE, &[], &reference.digest_value)?;
    w.end_element(node::REFERENCE)?;
    w.end_element(node::SIGNED_INFO)
}

/// The canonical octets of `SignedInfo` as it sits in the final document.
fn canonical_signed_info(
    reference: &ReferenceParts<'_>,
    signature_method: &str,
) -> Result<Vec<u8>, Error> {
    let mut w = XmlWriter::new();
    w.start_element(ns::node::SIGNATURE, &[("xmlns", ns::DSIG)])?;
    write_signed_info(&mut w, reference, signature_method)?;
    w.end_element(ns::node::SIGNATURE)?;
    let context = w.into_string()?;

    let doc = avskild_xml::parse(&context)?;
    let signed_info = avskild_xml::document::find_element(&doc, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;
    avskild_c14n::canonicalize_subtree(signed_info, C14nMode::Inclusive)
}
