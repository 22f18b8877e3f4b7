#![forbid(unsafe_code)]

//! Read-only description of a signature document.

use crate::verify::read_signature;
use avskild_core::Error;
use avskild_keys::keyinfo;

/// What a signature document declares about itself.
///
/// Nothing here is trusted; the embedded key material is decoded for
/// display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSummary {
    pub reference_uri: String,
    pub digest_method: String,
    pub signature_method: String,
    pub canonicalization_method: String,
    /// `false` when `<Signature>` was found by plain tag name.
    pub namespace_qualified: bool,
    pub subject_name: Option<String>,
    /// Subject of the embedded `X509Certificate`, if any.
    pub certificate_subject: Option<String>,
    /// Key type of the embedded `KeyValue`, e.g. `RSA-2048 public key`.
    pub key_description: Option<String>,
}

/// Describe `signature_document` using the same lookup rules as the verifier.
pub fn inspect(signature_document: &[u8]) -> Result<SignatureSummary, Error> {
    let xml = avskild_xml::as_utf8(signature_document)?;
    let doc = avskild_xml::parse(xml)?;
    let parsed = read_signature(&doc)?;

    let key_info = parsed
        .key_info
        .map(|node| keyinfo::read_key_info(node, parsed.namespaces))
        .transpose()?
        .unwrap_or_default();
    let key_description = key_info
        .key_value
        .as_ref()
        .or(key_info.certificate.as_ref().map(|c| c.public_key()))
        .map(|key| format!("{:?}", key.data));

    Ok(SignatureSummary {
        reference_uri: parsed.reference_uri.to_owned(),
        digest_method: parsed.digest_method.to_owned(),
        signature_method: parsed.signature_method.to_owned(),
        canonicalization_method: parsed.c14n_method.to_owned(),
        namespace_qualified: parsed.namespace_qualified,
        subject_name: key_info.subject_name,
        certificate_subject: key_info
            .certificate
            .as_ref()
            .map(|c| c.subject_name().to_owned()),
        key_description,
    })
}

impl std::fmt::Display for SignatureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Reference URI:      {}", self.reference_uri)?;
        writeln!(f, "Digest method:      {}", self.digest_method)?;
        writeln!(f, "Signature method:   {}", self.signature_method)?;
        writeln!(f, "Canonicalization:   {}", self.canonicalization_method)?;
        let namespace = if self.namespace_qualified {
            "XML-DSig"
        } else {
            "none (legacy)"
        };
        writeln!(f, "Namespace:          {namespace}")?;
        if let Some(subject) = &self.subject_name {
            writeln!(f, "X509SubjectName:    {subject}")?;
        }
        if let Some(subject) = &self.certificate_subject {
            writeln!(f, "Certificate:        {subject}")?;
        }
        if let Some(key) = &self.key_description {
            writeln!(f, "Key:                {key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avskild_core::algorithm;

    fn fixture(name: &str) -> Vec<u8> {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../test-data")
            .join(name);
        std::fs::read(path).unwrap()
    }

    #[test]
    fn test_inspect_prefixed_fixture() {
        let summary = inspect(&fixture("document.sign.xml")).unwrap();
        assert_eq!(summary.reference_uri, "document.xml");
        assert_eq!(summary.digest_method, algorithm::SHA512);
        assert_eq!(summary.signature_method, algorithm::RSA_SHA512);
        assert_eq!(summary.canonicalization_method, algorithm::C14N);
        assert!(summary.namespace_qualified);
        assert_eq!(summary.subject_name, None);
        assert_eq!(
            summary.certificate_subject.as_deref(),
            Some("CN=Test Signer,O=Avskild Test,C=HU")
        );
        assert_eq!(summary.key_description.as_deref(), Some("RSA-2048 public key"));
    }

    #[test]
    fn test_inspect_legacy_fixture() {
        let summary = inspect(&fixture("document.legacy.sign.xml")).unwrap();
        assert!(!summary.namespace_qualified);
        assert_eq!(summary.certificate_subject, None);
        assert_eq!(summary.key_description, None);
        assert!(summary.to_string().contains("none (legacy)"));
    }

    #[test]
    fn test_inspect_without_signature() {
        let err = inspect(b"<root><child/></root>").unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));
    }
}
